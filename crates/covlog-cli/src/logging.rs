//! Diagnostic logging setup
//!
//! Library diagnostics go through `tracing`; this installs the fmt
//! subscriber on stderr. `RUST_LOG` overrides the level picked from
//! `-q`/`-v`.

use crate::config::Verbosity;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter directive used when `RUST_LOG` is unset
#[must_use]
pub fn default_directive(verbosity: Verbosity) -> String {
    let level = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::Debug => "debug",
    };
    format!("covlog={level},covlog_cli={level}")
}

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_debug())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(Verbosity::Normal), "covlog=warn,covlog_cli=warn");
        assert_eq!(default_directive(Verbosity::Debug), "covlog=debug,covlog_cli=debug");
        assert!(default_directive(Verbosity::Quiet).contains("error"));
    }

    #[test]
    fn test_init_twice() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Debug);
    }
}
