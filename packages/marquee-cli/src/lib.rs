//! Command-line plumbing shared by Marquee binaries.

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

/// Package version followed by the git revision and target it was built from.
pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	" (",
	env!("VERGEN_GIT_SHA"),
	", ",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
	")",
);

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn styles() -> Styles {
	let accent = AnsiColor::Yellow.on_default() | Effects::BOLD;

	Styles::styled()
		.header(accent)
		.usage(accent)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Filter for the configured log level. A directive that does not parse falls back to
/// [`DEFAULT_LOG_LEVEL`].
pub fn log_filter(level: &str) -> EnvFilter {
	let level = level.trim();

	if level.is_empty() {
		return EnvFilter::new(DEFAULT_LOG_LEVEL);
	}

	EnvFilter::try_new(level).unwrap_or_else(|err| {
		eprintln!("Invalid log level {level:?}: {err}. Using {DEFAULT_LOG_LEVEL}.");

		EnvFilter::new(DEFAULT_LOG_LEVEL)
	})
}

pub fn init_tracing(level: &str) {
	tracing_subscriber::fmt().with_env_filter(log_filter(level)).init();
}
