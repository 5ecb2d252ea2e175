//! Logging facade for the launcher
//!
//! Two loggers coexist. The default structured pipeline is `tracing`,
//! initialized once at startup with a level resolved from the `--loglevel`
//! flag, then the `LOG_LEVEL` environment variable, then `info`. The
//! second logger is a plain prefix-only writer used exclusively to forward
//! the validator child's stdout, so the binary's own formatted output
//! stays legible in aggregated logs instead of being double-decorated.

use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Prefix stamped on every forwarded child stdout line.
const VALIDATOR_PREFIX: &str = "[validator]";

/// Initialize the global tracing subscriber.
pub fn init(loglevel: Option<&str>) {
    let level = resolve_level(loglevel);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();
    info!("Logger initialized at level {}", level);
}

/// Resolve the effective log level: the flag wins over `LOG_LEVEL`, which
/// wins over the default. Unrecognized levels silently map to `info`.
fn resolve_level(flag: Option<&str>) -> &'static str {
    let raw = flag
        .map(str::to_owned)
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_default();
    match raw.to_lowercase().as_str() {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => DEFAULT_LEVEL,
    }
}

/// Forward one line of validator stdout verbatim, prefix only.
pub fn validator_output(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{} {}", VALIDATOR_PREFIX, line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_levels_resolve() {
        assert_eq!(resolve_level(Some("debug")), "debug");
        assert_eq!(resolve_level(Some("warn")), "warn");
        assert_eq!(resolve_level(Some("error")), "error");
        assert_eq!(resolve_level(Some("info")), "info");
    }

    #[test]
    fn levels_are_case_insensitive() {
        assert_eq!(resolve_level(Some("DEBUG")), "debug");
        assert_eq!(resolve_level(Some("Warn")), "warn");
    }

    #[test]
    fn unknown_levels_map_to_info() {
        assert_eq!(resolve_level(Some("trace")), "info");
        assert_eq!(resolve_level(Some("verbose")), "info");
    }
}
