use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
	pub id: i64,
	pub name: String,
	pub short_description: String,
	pub year: Option<i32>,
	pub logo: String,
	pub genres: Vec<String>,
	pub countries: Vec<String>,
	pub persons: Vec<Person>,
	/// Popularity score used to order filter-only searches.
	pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpgItem {
	pub name: String,
	pub description: String,
	pub channel_id: i64,
	/// Unix seconds.
	pub start_time: i64,
	pub end_time: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MediaItemRow {
	pub(crate) id: i64,
	pub(crate) name: String,
	pub(crate) short_description: String,
	pub(crate) year: Option<i32>,
	pub(crate) logo: String,
	pub(crate) genres_names: Vec<String>,
	pub(crate) countries: Vec<String>,
	pub(crate) persons_names: Vec<String>,
	pub(crate) rating: f32,
}
impl From<MediaItemRow> for MediaItem {
	fn from(row: MediaItemRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			short_description: row.short_description,
			year: row.year,
			logo: row.logo,
			genres: row.genres_names,
			countries: row.countries,
			persons: row.persons_names.into_iter().map(|name| Person { name }).collect(),
			rating: row.rating,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EpgItemRow {
	pub(crate) name: String,
	pub(crate) description: String,
	pub(crate) channel_id: i64,
	pub(crate) start_time: i64,
	pub(crate) end_time: i64,
}
impl From<EpgItemRow> for EpgItem {
	fn from(row: EpgItemRow) -> Self {
		Self {
			name: row.name,
			description: row.description,
			channel_id: row.channel_id,
			start_time: row.start_time,
			end_time: row.end_time,
		}
	}
}
