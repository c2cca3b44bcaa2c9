//! Log output setup for the `alu8-sim` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the executable.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is given.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Standard error.
    Stderr,
    /// Append to a file. Required for readable logs under the TUI.
    File(&'a Path),
    /// Discard everything.
    Off,
}

/// Build the event filter: explicit directives win over `RUST_LOG`, which
/// wins over [`DEFAULT_DIRECTIVE`].
pub fn build_filter(directives: Option<&str>) -> EnvFilter {
    match directives {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

/// Install the global subscriber. Calling it twice is harmless; the first
/// subscriber stays.
pub fn init(directives: Option<&str>, target: LogTarget<'_>) -> std::io::Result<()> {
    let filter = build_filter(directives);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };

    // already initialized (tests, repeated calls)
    let _ = result;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directive_wins() {
        let filter = build_filter(Some("alu8=debug"));
        assert_eq!(filter.to_string(), "alu8=debug");
    }

    #[test]
    fn test_bad_directive_falls_back() {
        let filter = build_filter(Some("alu8=verbose"));
        assert_eq!(filter.to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn test_off_installs_nothing() {
        assert!(init(None, LogTarget::Off).is_ok());
    }
}
