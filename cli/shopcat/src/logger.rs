use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable selecting the log verbosity, like repeated `-v`
pub const SHOPCAT_VERBOSITY_VAR: &str = "SHOPCAT_VERBOSITY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verbosity {
    inner: u8,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        Self { inner: value }
    }
}

impl Verbosity {
    pub fn env_filter(&self) -> &'static str {
        match self.inner {
            0 => "shopcat=warn,shop_catalog=warn",
            1 => "shopcat=debug,shop_catalog=debug",
            _ => "shopcat=trace,shop_catalog=trace",
        }
    }

    /// Pick a filter from `RUST_LOG`, then [SHOPCAT_VERBOSITY_VAR], then the
    /// number of `-v` flags.
    pub fn filter_from_env_and_arg(
        rust_log: Option<String>,
        verbosity_var: Option<String>,
        arg: u8,
    ) -> String {
        let rust_log = rust_log.context("RUST_LOG not present");
        let our_variable = verbosity_var
            .ok_or(anyhow!("verbosity variable not present"))
            .and_then(|value| {
                value
                    .parse::<u8>()
                    .context("failed to parse verbosity as int")
                    .map(Verbosity::from)
                    .map(|v| v.env_filter().to_string())
            });
        rust_log
            .or(our_variable)
            .unwrap_or_else(|_| Verbosity::from(arg).env_filter().to_string())
    }
}

pub fn init_logger(verbosity_arg: u8) -> Result<(), anyhow::Error> {
    let filter = Verbosity::filter_from_env_and_arg(
        std::env::var("RUST_LOG").ok(),
        std::env::var(SHOPCAT_VERBOSITY_VAR).ok(),
        verbosity_arg,
    );
    let filter = EnvFilter::try_new(&filter).context("invalid log filter")?;

    // stdout carries command output, logs go to stderr
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(log_layer)
        .try_init()
        .context("failed to initialize logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins() {
        let filter = Verbosity::filter_from_env_and_arg(
            Some("shop_catalog=trace".to_string()),
            Some("1".to_string()),
            0,
        );
        assert_eq!(filter, "shop_catalog=trace");
    }

    #[test]
    fn verbosity_variable_beats_flags() {
        let filter = Verbosity::filter_from_env_and_arg(None, Some("1".to_string()), 2);
        assert_eq!(filter, Verbosity::from(1).env_filter());
    }

    #[test]
    fn unparsable_variable_falls_back_to_flags() {
        let filter = Verbosity::filter_from_env_and_arg(None, Some("loud".to_string()), 2);
        assert_eq!(filter, "shopcat=trace,shop_catalog=trace");

        let filter = Verbosity::filter_from_env_and_arg(None, None, 0);
        assert_eq!(filter, "shopcat=warn,shop_catalog=warn");
    }
}
