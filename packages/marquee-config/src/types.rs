use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub sessions: Sessions,
	#[serde(default)]
	pub intents: Intents,
	#[serde(default)]
	pub presentation: Presentation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Candidate cap when results are ordered by rating and one is picked at random.
	pub filtered_limit: u32,
	/// Candidate cap when the best relevancy match wins.
	pub relevancy_limit: u32,
	pub epg_limit: u32,
	pub timeout_ms: u64,
	/// Minimum `word_similarity` for a fuzzy term to count as a match.
	pub fuzzy_threshold: f32,
	/// Fixed seed for the random pick. Unset means seeded from OS entropy.
	pub rng_seed: Option<u64>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			filtered_limit: 100,
			relevancy_limit: 10,
			epg_limit: 10,
			timeout_ms: 3_000,
			fuzzy_threshold: 0.6,
			rng_seed: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Sessions {
	/// Sessions untouched for longer than this are evicted. Zero disables eviction.
	pub idle_ttl_seconds: u64,
	pub sweep_interval_seconds: u64,
}
impl Default for Sessions {
	fn default() -> Self {
		Self { idle_ttl_seconds: 3_600, sweep_interval_seconds: 60 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Intents {
	pub reset: Vec<String>,
}
impl Default for Intents {
	fn default() -> Self {
		Self { reset: vec!["find-movie - reset".to_string()] }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Presentation {
	pub image_base_url: String,
	pub open_url_base: String,
	pub subtitle_max_chars: usize,
}
impl Default for Presentation {
	fn default() -> Self {
		Self {
			image_base_url: "https://mos-itv01.svc.iptv.rt.ru".to_string(),
			open_url_base: "http://production.smarttv.itv.restr.im/pc/#/media_item/".to_string(),
			subtitle_max_chars: 120,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
