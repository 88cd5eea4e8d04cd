use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `STARLING_LOG=starling=debug`.
pub const LOG_ENV: &str = "STARLING_LOG";

/// Install a fmt subscriber writing to stderr. The filter comes from
/// `STARLING_LOG`, falling back to `debug` when verbose and `info` otherwise.
///
/// Returns false if a global subscriber was already installed.
pub fn init(verbose: bool) -> bool {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        init(false);
        assert!(!init(true));
        tracing::debug!("subscriber installed");
    }
}
