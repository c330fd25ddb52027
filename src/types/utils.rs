//! Shared helpers for timestamps and row decoding.

use std::fmt::Display;

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with microseconds.
///
/// Fixed width, so lexical order matches chronological order.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a Result to Option, logging the error at debug level.
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

/// Like log_filter_error but logs at warn level for more important operations.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let first = now_rfc3339();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = now_rfc3339();
        assert!(first < second);
        assert!(first.ends_with('Z'));
    }

    #[test]
    fn test_log_filter_error() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("bad row".to_string());
        assert_eq!(log_filter_error(ok, "reading"), Some(1));
        assert_eq!(log_filter_warn(err, "reading"), None);
    }
}
