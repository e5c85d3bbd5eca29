use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, MarqueeService, Result};
use marquee_domain::{fulltext, query};
use marquee_storage::models::EpgItem;

#[derive(Debug, Clone, Deserialize)]
pub struct EpgSearchRequest {
	pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpgSearchResponse {
	pub items: Vec<EpgItem>,
}

impl MarqueeService {
	/// Upcoming programmes matching the request text, best match first.
	pub async fn search_epg(&self, req: EpgSearchRequest) -> Result<EpgSearchResponse> {
		self.search_epg_at(req, OffsetDateTime::now_utc()).await
	}

	pub async fn search_epg_at(
		&self,
		req: EpgSearchRequest,
		now: OffsetDateTime,
	) -> Result<EpgSearchResponse> {
		let text = req.query.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		if fulltext::words(text).is_empty() {
			return Err(Error::InvalidRequest {
				message: "query must contain at least one word.".to_string(),
			});
		}

		let search = query::epg_query(text, now, self.cfg.search.epg_limit);
		let items = self
			.search_or_empty(&search)
			.await
			.into_iter()
			.filter_map(|record| record.into_epg())
			.collect();

		Ok(EpgSearchResponse { items })
	}
}
