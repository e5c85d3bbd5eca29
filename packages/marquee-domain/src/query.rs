use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
	fulltext::{self, ALL_FIELDS, ExpressionBuilder},
	search::{Filter, Operator, SearchIndex, SearchQuery, Sort},
	slot::{Period, SlotName, SlotSet},
};
use marquee_config::Search;

pub const MEDIA_TYPE_FILM: &str = "film";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_PARENT_ID: &str = "parent_id";
pub const FIELD_YEAR: &str = "year";
pub const FIELD_RATING: &str = "rating";
pub const FIELD_START_TIME: &str = "start_time";

const SLOT_FIELD_WEIGHT: f32 = 1.0;
const FALLBACK_SCOPE: [(&str, f32); 2] = [(ALL_FIELDS, 0.3), ("name", 1.1)];
const EPG_SCOPE: [(&str, f32); 2] = [("name", 1.0), ("description", 0.3)];

/// Slots that become full-text clauses, in clause order.
const CLAUSE_SLOTS: [SlotName; 4] =
	[SlotName::Genre, SlotName::Origin, SlotName::Persons, SlotName::Name];

/// Inclusive release year bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
	pub from: Option<i32>,
	pub to: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
	pub full_text: String,
	pub rank_by_relevancy: bool,
	pub years: YearRange,
	pub limit: u32,
	/// Slots that produced a scoped clause. Empty means the free-text fallback was used.
	pub clauses: Vec<SlotName>,
}
impl CompiledQuery {
	pub fn is_fallback(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn to_search_query(&self) -> SearchQuery {
		let mut filters = vec![
			Filter::eq(FIELD_TYPE, MEDIA_TYPE_FILM),
			Filter::empty(FIELD_PARENT_ID),
		];

		if let Some(from) = self.years.from {
			filters.push(Filter::int(FIELD_YEAR, Operator::Ge, from.into()));
		}
		if let Some(to) = self.years.to {
			filters.push(Filter::int(FIELD_YEAR, Operator::Le, to.into()));
		}

		// Relevancy queries keep the engine's own ordering.
		let sort = (!self.rank_by_relevancy)
			.then(|| Sort { field: FIELD_RATING.to_string(), descending: true });

		SearchQuery {
			index: SearchIndex::MediaItems,
			filters,
			full_text: self.full_text.clone(),
			sort,
			limit: self.limit,
		}
	}
}

pub fn compile(slots: &SlotSet, free_text: &str, cfg: &Search) -> CompiledQuery {
	let mut builder = ExpressionBuilder::new();
	let mut clauses = Vec::new();
	let mut rank_by_relevancy = false;

	for slot in CLAUSE_SLOTS {
		let (Some(field), Some(text)) = (slot_field(slot), slots.text(slot)) else {
			continue;
		};
		let words = fulltext::words(text);

		if words.is_empty() {
			continue;
		}

		builder.scope(&[(field, SLOT_FIELD_WEIGHT)], &words, true, true);
		clauses.push(slot);

		// A title names one film, so the best match wins over a random pick.
		if slot == SlotName::Name {
			rank_by_relevancy = true;
		}
	}

	if builder.is_empty() {
		builder.scope(&FALLBACK_SCOPE, &fulltext::words(free_text), false, false);

		rank_by_relevancy = true;
	}

	let years = slots.get(SlotName::Period).as_period().map(resolve_years).unwrap_or_default();
	let limit = if rank_by_relevancy { cfg.relevancy_limit } else { cfg.filtered_limit };

	CompiledQuery { full_text: builder.finish(), rank_by_relevancy, years, limit, clauses }
}

/// Upcoming programme guide entries matching `text`, best match first.
pub fn epg_query(text: &str, now: OffsetDateTime, limit: u32) -> SearchQuery {
	let mut builder = ExpressionBuilder::new();

	builder.scope(&EPG_SCOPE, &fulltext::words(text), false, false);

	SearchQuery {
		index: SearchIndex::Epg,
		filters: vec![Filter::int(FIELD_START_TIME, Operator::Gt, now.unix_timestamp())],
		full_text: builder.finish(),
		sort: None,
		limit,
	}
}

pub fn resolve_years(period: &Period) -> YearRange {
	YearRange {
		from: period.start.as_deref().and_then(|raw| bound_year(raw, "startDate")),
		to: period.end.as_deref().and_then(|raw| bound_year(raw, "endDate")),
	}
}

fn bound_year(raw: &str, bound: &'static str) -> Option<i32> {
	match OffsetDateTime::parse(raw, &Rfc3339) {
		Ok(ts) => Some(ts.year()),
		Err(err) => {
			tracing::warn!(bound, value = raw, error = %err, "Ignoring malformed period bound.");

			None
		},
	}
}

fn slot_field(slot: SlotName) -> Option<&'static str> {
	match slot {
		SlotName::Genre => Some("genres_names"),
		SlotName::Origin => Some("countries"),
		SlotName::Persons => Some("persons_names"),
		SlotName::Name => Some("name"),
		SlotName::Period => None,
	}
}
