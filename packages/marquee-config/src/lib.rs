mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Intents, Postgres, Presentation, Search, Service, Sessions, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty"));
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::invalid("storage.postgres.dsn", "must be non-empty"));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero"));
	}

	for (field, value) in [
		("search.filtered_limit", cfg.search.filtered_limit),
		("search.relevancy_limit", cfg.search.relevancy_limit),
		("search.epg_limit", cfg.search.epg_limit),
	] {
		if value == 0 {
			return Err(Error::invalid(field, "must be greater than zero"));
		}
	}

	if cfg.search.timeout_ms == 0 {
		return Err(Error::invalid("search.timeout_ms", "must be greater than zero"));
	}
	if !cfg.search.fuzzy_threshold.is_finite() {
		return Err(Error::invalid("search.fuzzy_threshold", "must be a finite number"));
	}
	if !(0.0..=1.0).contains(&cfg.search.fuzzy_threshold) {
		return Err(Error::invalid("search.fuzzy_threshold", "must be in the range 0.0-1.0"));
	}
	if cfg.sessions.idle_ttl_seconds > 0 && cfg.sessions.sweep_interval_seconds == 0 {
		return Err(Error::invalid(
			"sessions.sweep_interval_seconds",
			"must be greater than zero when sessions.idle_ttl_seconds is set",
		));
	}
	if cfg.intents.reset.is_empty() {
		return Err(Error::invalid("intents.reset", "must list at least one intent"));
	}
	if cfg.presentation.subtitle_max_chars == 0 {
		return Err(Error::invalid("presentation.subtitle_max_chars", "must be greater than zero"));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.intents.reset.retain(|intent| !intent.trim().is_empty());

	for intent in cfg.intents.reset.iter_mut() {
		*intent = intent.trim().to_string();
	}

	let base = cfg.presentation.image_base_url.trim_end_matches('/').to_string();

	cfg.presentation.image_base_url = base;
}
