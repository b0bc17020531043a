use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::matrix::chip_path;

/// Flags accepted by `m100kbd run`.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Settle delay after driving a row, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub debounce: u64,

    /// Matrix scan interval in milliseconds
    #[arg(long, default_value_t = 5)]
    pub scan_interval: u64,

    /// Minimum delay between repeated presses of the same key in milliseconds (0 disables)
    #[arg(long, default_value_t = 100)]
    pub key_repeat: u64,

    /// Delay after key emission in milliseconds
    #[arg(long, default_value_t = 50)]
    pub post_key_delay: u64,

    /// GPIO chip device (gpiochip0 or gpiochip4, or a full path)
    #[arg(long, default_value = "gpiochip0")]
    pub gpio_chip: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Runtime configuration of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pause between driving a row and sampling its columns.
    pub settle_delay: Duration,
    pub scan_interval: Duration,
    /// Presses of the same regular key closer than this are dropped.
    pub key_repeat: Duration,
    pub post_key_delay: Duration,
    pub gpio_chip: PathBuf,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(10),
            scan_interval: Duration::from_millis(5),
            key_repeat: Duration::from_millis(100),
            post_key_delay: Duration::from_millis(50),
            // Most common for older Pi models
            gpio_chip: chip_path("gpiochip0"),
            debug: false,
        }
    }
}

impl From<ScanArgs> for Config {
    fn from(args: ScanArgs) -> Self {
        Self {
            settle_delay: Duration::from_millis(args.debounce),
            scan_interval: Duration::from_millis(args.scan_interval),
            key_repeat: Duration::from_millis(args.key_repeat),
            post_key_delay: Duration::from_millis(args.post_key_delay),
            gpio_chip: chip_path(&args.gpio_chip),
            debug: args.debug,
        }
    }
}

/// Install the global log subscriber. `RUST_LOG` overrides the `--debug`
/// derived level.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        scan: ScanArgs,
    }

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("m100kbd").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().scan.into()
    }

    #[test]
    fn test_defaults_match_flags() {
        assert_eq!(parse(&[]), Config::default());
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--debounce",
            "2",
            "--scan-interval",
            "20",
            "--key-repeat",
            "0",
            "--post-key-delay",
            "7",
            "--gpio-chip",
            "gpiochip4",
            "--debug",
        ]);
        assert_eq!(config.settle_delay, Duration::from_millis(2));
        assert_eq!(config.scan_interval, Duration::from_millis(20));
        assert_eq!(config.key_repeat, Duration::ZERO);
        assert_eq!(config.post_key_delay, Duration::from_millis(7));
        assert_eq!(config.gpio_chip, PathBuf::from("/dev/gpiochip4"));
        assert!(config.debug);
    }

    #[test]
    fn test_rejects_negative_delay() {
        let argv = ["m100kbd", "--debounce", "-1"];
        assert!(Harness::try_parse_from(argv).is_err());
    }
}
