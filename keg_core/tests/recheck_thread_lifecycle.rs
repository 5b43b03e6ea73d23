mod common;

use chrono::Duration;
use common::rig;
use keg_core::Rechecker;
use std::time::{Duration as StdDuration, Instant};

#[test]
fn rechecker_closes_a_stale_pub() {
    let r = rig();
    r.engine.ping();
    r.clock.advance(Duration::minutes(11));

    let rechecker = Rechecker::spawn(r.engine.clone(), StdDuration::from_millis(10));
    assert!(rechecker.is_running());

    let deadline = Instant::now() + StdDuration::from_secs(2);
    while r.engine.get_opening().is_open {
        assert!(Instant::now() < deadline, "pub never closed");
        std::thread::sleep(StdDuration::from_millis(5));
    }
    rechecker.stop();
}

#[test]
fn drop_joins_promptly_even_with_long_interval() {
    let r = rig();
    let rechecker = Rechecker::spawn(r.engine.clone(), StdDuration::from_secs(3600));
    let start = Instant::now();
    drop(rechecker);
    assert!(start.elapsed() < StdDuration::from_secs(1));
    // the engine is released by the thread
    assert_eq!(std::sync::Arc::strong_count(&r.engine), 1);
}
