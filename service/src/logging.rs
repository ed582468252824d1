use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose debug output drowns the proxy's own logs.
/// Shown only at Trace.
const FILTERED_MODULES: &[&str] = &[
    "tower", "hyper", "h2", "axum", "reqwest", "rustls", "mio",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Colors are off in production so log shippers get plain text.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;

        TermLogger::init(
            level,
            Self::build_log_config(level),
            TerminalMode::Mixed,
            Self::color_choice(config),
        )
    }

    fn color_choice(config: &Config) -> ColorChoice {
        if config.is_production() {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        }
    }

    fn filters_dependencies(level: LevelFilter) -> bool {
        level < LevelFilter::Trace
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if Self::filters_dependencies(level) {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_http_stack_is_filtered() {
        for module in ["hyper", "reqwest", "rustls", "axum"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
        // Our own crates must never be filtered.
        assert!(!FILTERED_MODULES.contains(&"bank_auth"));
        assert!(!FILTERED_MODULES.contains(&"domain"));
    }

    #[test]
    fn test_only_trace_shows_dependencies() {
        assert!(!Logger::filters_dependencies(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::filters_dependencies(level));
        }
    }

    #[test]
    fn test_build_log_config_does_not_panic() {
        let _filtered = Logger::build_log_config(LevelFilter::Info);
        let _unfiltered = Logger::build_log_config(LevelFilter::Trace);
    }

    #[test]
    fn test_production_disables_colors() {
        let production =
            Config::try_parse_from(["bank_dashboard", "--runtime-env", "production"]).unwrap();
        let development = Config::try_parse_from(["bank_dashboard"]).unwrap();

        assert!(matches!(Logger::color_choice(&production), ColorChoice::Never));
        assert!(matches!(Logger::color_choice(&development), ColorChoice::Auto));
    }
}
