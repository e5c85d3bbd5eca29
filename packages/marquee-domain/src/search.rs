use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIndex {
	MediaItems,
	Epg,
}
impl SearchIndex {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MediaItems => "media_items",
			Self::Epg => "epg",
		}
	}
}
impl fmt::Display for SearchIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
	Eq,
	Gt,
	Ge,
	Lt,
	Le,
	/// Field is unset. The value is ignored.
	Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
	Int(i64),
	Text(String),
}

/// Structural predicate. Filters of one query are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
	pub field: String,
	pub op: Operator,
	pub value: FilterValue,
}
impl Filter {
	pub fn new(field: impl Into<String>, op: Operator, value: FilterValue) -> Self {
		Self { field: field.into(), op, value }
	}

	pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(field, Operator::Eq, FilterValue::Text(value.into()))
	}

	pub fn empty(field: impl Into<String>) -> Self {
		Self::new(field, Operator::Empty, FilterValue::Int(0))
	}

	pub fn int(field: impl Into<String>, op: Operator, value: i64) -> Self {
		Self::new(field, op, FilterValue::Int(value))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
	pub field: String,
	pub descending: bool,
}

/// One request to the search backend.
///
/// Without `sort`, results come back best relevancy match first. `limit` caps the returned rows,
/// not the matched ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
	pub index: SearchIndex,
	pub filters: Vec<Filter>,
	pub full_text: String,
	pub sort: Option<Sort>,
	pub limit: u32,
}
