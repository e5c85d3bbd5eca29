pub mod epg;
pub mod reply;
pub mod sessions;
pub mod turn;

mod error;

pub use epg::{EpgSearchRequest, EpgSearchResponse};
pub use error::{Error, Result};
pub use sessions::{ExpiryPolicy, SessionStore};
pub use turn::{TurnRequest, TurnResponse};

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
	time::Duration,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use marquee_config::Config;
use marquee_domain::search::{SearchIndex, SearchQuery};
use marquee_storage::{
	db::Db,
	models::{EpgItem, MediaItem},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One transient failure is retried; anything beyond that degrades to an empty result.
const MAX_SEARCH_ATTEMPTS: u32 = 2;

/// The full-text store that answers [`SearchQuery`]s.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<Record>>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
	Media(MediaItem),
	Epg(EpgItem),
}
impl Record {
	pub fn into_media(self) -> Option<MediaItem> {
		match self {
			Self::Media(item) => Some(item),
			Self::Epg(_) => None,
		}
	}

	pub fn into_epg(self) -> Option<EpgItem> {
		match self {
			Self::Epg(item) => Some(item),
			Self::Media(_) => None,
		}
	}
}

/// [`SearchBackend`] over the Postgres tables managed by `marquee-storage`.
pub struct PgSearchBackend {
	pub db: Db,
	pub fuzzy_threshold: f32,
}
impl SearchBackend for PgSearchBackend {
	fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<Record>>> {
		Box::pin(async move {
			let records = match query.index {
				SearchIndex::MediaItems =>
					queries::search_media_items(&self.db, query, self.fuzzy_threshold)
						.await?
						.into_iter()
						.map(Record::Media)
						.collect(),
				SearchIndex::Epg => queries::search_epg_items(&self.db, query, self.fuzzy_threshold)
					.await?
					.into_iter()
					.map(Record::Epg)
					.collect(),
			};

			Ok(records)
		})
	}
}

pub struct MarqueeService {
	pub cfg: Config,
	pub sessions: SessionStore,
	backend: Arc<dyn SearchBackend>,
	rng: Mutex<ChaCha8Rng>,
}
impl MarqueeService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let backend = PgSearchBackend { db, fuzzy_threshold: cfg.search.fuzzy_threshold };

		Self::with_backend(cfg, Arc::new(backend))
	}

	pub fn with_backend(cfg: Config, backend: Arc<dyn SearchBackend>) -> Self {
		let rng = match cfg.search.rng_seed {
			Some(seed) => ChaCha8Rng::seed_from_u64(seed),
			None => ChaCha8Rng::from_entropy(),
		};

		Self::with_rng(cfg, backend, rng)
	}

	pub fn with_rng(cfg: Config, backend: Arc<dyn SearchBackend>, rng: ChaCha8Rng) -> Self {
		let sessions = SessionStore::new(ExpiryPolicy::from_config(&cfg.sessions));

		Self { cfg, sessions, backend, rng: Mutex::new(rng) }
	}

	/// Runs `query` with the configured timeout.
	///
	/// Failures never reach the caller: a timeout, a permanent error, or a transient error that
	/// survives the retry all come back as an empty list.
	pub(crate) async fn search_or_empty(&self, query: &SearchQuery) -> Vec<Record> {
		let timeout = Duration::from_millis(self.cfg.search.timeout_ms);

		for attempt in 1..=MAX_SEARCH_ATTEMPTS {
			match tokio::time::timeout(timeout, self.backend.search(query)).await {
				Ok(Ok(records)) => {
					tracing::debug!(index = %query.index, count = records.len(), "Search completed.");

					return records;
				},
				Ok(Err(err)) if err.is_transient() && attempt < MAX_SEARCH_ATTEMPTS => {
					tracing::warn!(index = %query.index, attempt, error = %err, "Search failed; retrying.");
				},
				Ok(Err(err)) => {
					tracing::error!(index = %query.index, attempt, error = %err, "Search failed.");

					return Vec::new();
				},
				Err(_) => {
					tracing::warn!(
						index = %query.index,
						timeout_ms = self.cfg.search.timeout_ms,
						"Search timed out."
					);

					return Vec::new();
				},
			}
		}

		Vec::new()
	}

	pub(crate) fn with_rng_mut<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
		let mut rng = self.rng.lock().unwrap_or_else(|err| err.into_inner());

		f(&mut rng)
	}
}
