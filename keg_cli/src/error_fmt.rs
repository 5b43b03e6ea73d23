//! Human-readable error descriptions and structured JSON error formatting.

use keg_backends::StoreError;
use keg_core::{BuildError, KegError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingStore => {
                "What happened: No store was provided to the scale engine.\nLikely causes: The store backend failed to open or was not wired into the builder.\nHow to fix: Check [store] in the config and make sure the backend is passed via with_store(...).".to_string()
            }
            BuildError::InvalidSettings(msg) => format!(
                "What happened: Invalid engine settings ({msg}).\nLikely causes: Out-of-range values under [scale] or [pub] in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ke) = err.downcast_ref::<KegError>() {
        return match ke {
            KegError::StoreTimeout => "What happened: The state store did not answer in time.\nLikely causes: Slow or full disk, or store.timeout_ms configured too low.\nHow to fix: Check the disk holding store.path and consider raising store.timeout_ms.".to_string(),
            KegError::Store(msg) => format!(
                "What happened: The state store failed ({msg}).\nLikely causes: Missing permissions on store.path or a corrupt state file.\nHow to fix: Check the file and its directory; move a corrupt file aside to start from empty state."
            ),
            KegError::UnknownKeg(size) => format!(
                "What happened: {size} l is not a known keg size.\nLikely causes: A typo in the request.\nHow to fix: Use one of 10, 15, 20, 30 or 50."
            ),
            KegError::InvalidMessage(msg) => format!(
                "What happened: The scale sent a malformed message ({msg}).\nLikely causes: Firmware mismatch or a truncated request.\nHow to fix: Messages look like `push|<id>|<rssi>|<grams>` or `ping|<id>|<rssi>|0`."
            ),
            KegError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<StoreError>() {
        return match se {
            StoreError::Corrupt(e) => format!(
                "What happened: The state file is not valid JSON ({e}).\nLikely causes: The file was edited by hand or copied in partially.\nHow to fix: Move the file aside; the engine starts from empty state."
            ),
            other => format!(
                "What happened: The state store failed ({other}).\nLikely causes: Missing permissions on store.path.\nHow to fix: Check the file and its directory, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nLikely causes: A typo, a missing quote or a value of the wrong type.\nHow to fix: Fix or remove the offending key; every section is optional.",
            te.message().trim()
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        let cause = err
            .chain()
            .nth(1)
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid{cause}.\nLikely causes: A typo in a key or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Trace CSV header special-case
    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 'offset_s,weight'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes: 2 for setup problems, 3 for store failures.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<toml::de::Error>().is_some()
        || err.to_string().to_ascii_lowercase().contains("invalid configuration")
    {
        return 2;
    }
    match err.downcast_ref::<KegError>() {
        Some(KegError::Store(_) | KegError::StoreTimeout) => return 3,
        Some(_) => return 1,
        None => {}
    }
    if err.downcast_ref::<StoreError>().is_some() {
        return 3;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingStore => "MissingStore",
            BuildError::InvalidSettings(_) => "InvalidSettings",
        };
    }
    if let Some(ke) = err.downcast_ref::<KegError>() {
        return match ke {
            KegError::Store(_) => "Store",
            KegError::StoreTimeout => "StoreTimeout",
            KegError::UnknownKeg(_) => "UnknownKeg",
            KegError::InvalidMessage(_) => "InvalidMessage",
            KegError::State(_) => "State",
        };
    }
    if err.downcast_ref::<StoreError>().is_some() {
        return "Store";
    }
    if exit_code_for_error(err) == 2 {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn typed_errors_get_stable_codes() {
        let e = eyre::Report::new(KegError::StoreTimeout);
        assert_eq!(exit_code_for_error(&e), 3);
        assert!(humanize(&e).contains("store.timeout_ms"));

        let e = eyre::Report::new(BuildError::InvalidSettings("liveness window must be > 0"));
        assert_eq!(exit_code_for_error(&e), 2);

        let e = eyre::Report::new(KegError::UnknownKeg(25));
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).contains("25 l"));
    }

    #[test]
    fn config_errors_are_recognized_through_context() {
        let e: eyre::Result<()> = Err(eyre::eyre!("store.timeout_ms must be > 0"));
        let e = e.wrap_err("invalid configuration").unwrap_err();
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("store.timeout_ms must be > 0"));
    }

    #[test]
    fn toml_errors_are_config_errors() {
        let parsed = keg_config::load_toml("[store]\ntimeout_ms = \"soon\"\n");
        let e = eyre::Report::new(parsed.unwrap_err()).wrap_err("parse config keg.toml");
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).starts_with("What happened: The config file is not valid TOML"));
    }

    #[test]
    fn json_error_carries_reason_and_code() {
        let e = eyre::Report::new(KegError::Store("disk full".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Store");
        assert_eq!(v["exit_code"], 3);
        assert!(v["message"].as_str().unwrap().contains("disk full"));
    }
}
