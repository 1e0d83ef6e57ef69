//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--verbose` (debug) or `--quiet` (errors only)
//! 2. `HDRDEP_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`

use tracing_subscriber::fmt;

/// Environment variable read when neither `--verbose` nor `--quiet` is given.
pub const LOG_ENV: &str = "HDRDEP_LOG";

/// Installs the global subscriber. Logs go to stderr.
pub fn init_logging(quiet: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var(LOG_ENV).ok();
    let level = select_level(quiet, verbose, env.as_deref());

    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| format!("cannot install logger: {e}"))?;
    Ok(())
}

fn select_level(quiet: bool, verbose: bool, env: Option<&str>) -> tracing::Level {
    if verbose {
        return tracing::Level::DEBUG;
    }
    if quiet {
        return tracing::Level::ERROR;
    }
    env.and_then(parse_level_str).unwrap_or(tracing::Level::WARN)
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_beat_environment() {
        assert_eq!(select_level(false, true, Some("error")), tracing::Level::DEBUG);
        assert_eq!(select_level(true, false, Some("trace")), tracing::Level::ERROR);
    }

    #[test]
    fn environment_then_default() {
        assert_eq!(select_level(false, false, Some(" Info ")), tracing::Level::INFO);
        assert_eq!(select_level(false, false, Some("loud")), tracing::Level::WARN);
        assert_eq!(select_level(false, false, None), tracing::Level::WARN);
    }
}
