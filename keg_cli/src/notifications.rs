//! Announcement text and the hooks that deliver it.

use keg_backends::{LogNotifier, WebhookNotifier};
use keg_config::NotifyCfg;
use keg_core::{Event, EventKind, ScaleEngine};
use keg_traits::Notifier;
use std::sync::Arc;
use std::time::Duration;

fn beers(n: i64) -> String {
    if n == 1 {
        "1 beer".to_string()
    } else {
        format!("{n} beers")
    }
}

pub fn open_message(ev: &Event) -> String {
    let mut msg = String::from("Beer! 🍺\n");
    if ev.active_keg == 0 {
        msg.push_str("Nothing is tapped right now.\n");
    } else {
        msg.push_str(&format!(
            "On tap: {} l keg with {} left.\n",
            ev.active_keg,
            beers(i64::from(ev.beers_left))
        ));
    }
    msg.push_str(&format!("In the warehouse: {}.", beers(ev.warehouse_beers)));
    msg
}

pub fn keg_message(ev: &Event) -> String {
    format!(
        "New keg tapped: {} l, {} left. Warehouse: {}.",
        ev.active_keg,
        beers(i64::from(ev.beers_left)),
        beers(ev.warehouse_beers)
    )
}

fn notifier(url: Option<&str>, channel: &str, timeout: Duration) -> Arc<dyn Notifier> {
    match url {
        Some(url) => match WebhookNotifier::new(url, timeout) {
            Ok(hook) => Arc::new(hook),
            Err(e) => {
                tracing::warn!(channel, error = %e, "webhook client unavailable, logging instead");
                Arc::new(LogNotifier::new(channel))
            }
        },
        None => Arc::new(LogNotifier::new(channel)),
    }
}

/// Wire announcement hooks onto the engine's event bus.
pub fn register(engine: &ScaleEngine, cfg: &NotifyCfg) {
    let timeout = Duration::from_millis(cfg.timeout_ms);

    let open = notifier(cfg.open_webhook.as_deref(), "open", timeout);
    engine.on_event(EventKind::PubOpened, move |ev: &Event| {
        open.notify(&open_message(ev))
    });

    let keg = notifier(cfg.keg_webhook.as_deref(), "keg", timeout);
    engine.on_event(EventKind::NewKegTapped, move |ev: &Event| {
        keg.notify(&keg_message(ev))
    });

    engine.on_event(EventKind::PubClosed, |ev: &Event| {
        tracing::info!(at = %ev.at, "pub closed");
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn event(kind: EventKind, keg: i32, left: i32, stock: i64) -> Event {
        Event {
            kind,
            at: Utc.with_ymd_and_hms(2024, 5, 17, 17, 0, 0).unwrap(),
            active_keg: keg,
            beers_left: left,
            warehouse_beers: stock,
        }
    }

    #[rstest]
    #[case(0, "0 beers")]
    #[case(1, "1 beer")]
    #[case(2, "2 beers")]
    fn beer_counts_read_naturally(#[case] n: i64, #[case] expected: &str) {
        assert_eq!(beers(n), expected);
    }

    #[test]
    fn open_message_names_tap_and_stock() {
        let msg = open_message(&event(EventKind::PubOpened, 30, 41, 100));
        assert_eq!(
            msg,
            "Beer! 🍺\nOn tap: 30 l keg with 41 beers left.\nIn the warehouse: 100 beers."
        );
    }

    #[test]
    fn open_message_without_a_keg() {
        let msg = open_message(&event(EventKind::PubOpened, 0, 0, 1));
        assert!(msg.contains("Nothing is tapped"));
        assert!(msg.ends_with("In the warehouse: 1 beer."));
    }

    #[test]
    fn keg_message_is_one_line() {
        let msg = keg_message(&event(EventKind::NewKegTapped, 10, 20, 0));
        assert_eq!(msg, "New keg tapped: 10 l, 20 beers left. Warehouse: 0 beers.");
    }
}
