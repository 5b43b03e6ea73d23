#![no_main]
use keg_core::{MessageKind, ScaleMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(msg) = ScaleMessage::parse(data) {
        assert!(msg.rssi.is_finite());
        match msg.kind {
            MessageKind::Push => assert!(msg.value.is_some_and(f64::is_finite)),
            MessageKind::Ping => assert!(msg.value.is_none()),
        }
    }
});
