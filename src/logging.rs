//! Logging setup for hosts embedding the dispatcher.

/// Install a fmt subscriber. `RUST_LOG` wins over `level`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn second_init_is_harmless() {
        super::init("debug");
        assert!(!super::init("info"));
    }
}
