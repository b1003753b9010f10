//! cli::logging
//!
//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set; otherwise the level is `warn`, or `debug` with
//! `--debug`. Events go to stderr so command output stays pipeable.

use tracing_subscriber::{fmt, EnvFilter};

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "romidb=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; that one is kept
/// and the error from `try_init` is dropped, so calling this twice is fine.
pub fn init(debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_raises_level() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "romidb=debug");
    }

    #[test]
    fn init_twice_keeps_first_subscriber() {
        init(false);
        assert!(!init(true));
    }
}
