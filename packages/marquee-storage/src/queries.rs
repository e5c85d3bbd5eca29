//! Full-text search over Postgres.
//!
//! Expressions are evaluated with `pg_trgm`: fuzzy terms match when `word_similarity` reaches the
//! configured threshold, exact terms are case-insensitive substring matches. Field weights scale
//! each term's contribution to the `relevancy` score. Required terms must all match; when a query
//! has none, at least one optional term must.

use sqlx::{Postgres, QueryBuilder};

use crate::{
	Error, Result,
	db::Db,
	models::{EpgItem, EpgItemRow, MediaItem, MediaItemRow},
};
use marquee_domain::{
	fulltext::{self, ALL_FIELDS, Term},
	search::{Filter, FilterValue, Operator, SearchIndex, SearchQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
	Int,
	Text,
}

struct IndexLayout {
	index: SearchIndex,
	table: &'static str,
	select: &'static str,
	/// DSL field name to SQL text expression.
	text_fields: &'static [(&'static str, &'static str)],
	all_fields: &'static str,
	filter_columns: &'static [(&'static str, &'static str, ColumnKind)],
	sort_columns: &'static [(&'static str, &'static str)],
	tie_breaker: &'static str,
}

const MEDIA_ITEMS: IndexLayout = IndexLayout {
	index: SearchIndex::MediaItems,
	table: "media_items",
	select: "id, name, short_description, year, logo, genres_names, countries, persons_names, rating",
	text_fields: &[
		("name", "name"),
		("short_description", "short_description"),
		("genres_names", "array_to_string(genres_names, ' ')"),
		("countries", "array_to_string(countries, ' ')"),
		("persons_names", "array_to_string(persons_names, ' ')"),
	],
	all_fields: "concat_ws(' ', name, short_description, array_to_string(genres_names, ' '), \
array_to_string(countries, ' '), array_to_string(persons_names, ' '))",
	filter_columns: &[
		("type", "item_type", ColumnKind::Text),
		("parent_id", "parent_id", ColumnKind::Int),
		("year", "year", ColumnKind::Int),
	],
	sort_columns: &[("rating", "rating"), ("year", "year")],
	tie_breaker: "id",
};

const EPG_ITEMS: IndexLayout = IndexLayout {
	index: SearchIndex::Epg,
	table: "epg_items",
	select: "name, description, channel_id, start_time, end_time",
	text_fields: &[("name", "name"), ("description", "description")],
	all_fields: "concat_ws(' ', name, description)",
	filter_columns: &[
		("start_time", "start_time", ColumnKind::Int),
		("end_time", "end_time", ColumnKind::Int),
		("channel_id", "channel_id", ColumnKind::Int),
	],
	sort_columns: &[("start_time", "start_time")],
	tie_breaker: "start_time",
};

pub async fn search_media_items(
	db: &Db,
	query: &SearchQuery,
	fuzzy_threshold: f32,
) -> Result<Vec<MediaItem>> {
	let Some(mut builder) = build_search(&MEDIA_ITEMS, query, fuzzy_threshold)? else {
		return Ok(Vec::new());
	};
	let rows = builder.build_query_as::<MediaItemRow>().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(MediaItem::from).collect())
}

pub async fn search_epg_items(
	db: &Db,
	query: &SearchQuery,
	fuzzy_threshold: f32,
) -> Result<Vec<EpgItem>> {
	let Some(mut builder) = build_search(&EPG_ITEMS, query, fuzzy_threshold)? else {
		return Ok(Vec::new());
	};
	let rows = builder.build_query_as::<EpgItemRow>().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(EpgItem::from).collect())
}

pub async fn upsert_media_item(
	db: &Db,
	item: &MediaItem,
	item_type: &str,
	parent_id: Option<i64>,
) -> Result<()> {
	let persons = item.persons.iter().map(|person| person.name.clone()).collect::<Vec<_>>();

	sqlx::query(
		"\
INSERT INTO media_items (
	id,
	item_type,
	parent_id,
	name,
	short_description,
	year,
	logo,
	genres_names,
	countries,
	persons_names,
	rating
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
ON CONFLICT (id) DO UPDATE
SET
	item_type = EXCLUDED.item_type,
	parent_id = EXCLUDED.parent_id,
	name = EXCLUDED.name,
	short_description = EXCLUDED.short_description,
	year = EXCLUDED.year,
	logo = EXCLUDED.logo,
	genres_names = EXCLUDED.genres_names,
	countries = EXCLUDED.countries,
	persons_names = EXCLUDED.persons_names,
	rating = EXCLUDED.rating",
	)
	.bind(item.id)
	.bind(item_type)
	.bind(parent_id)
	.bind(item.name.as_str())
	.bind(item.short_description.as_str())
	.bind(item.year)
	.bind(item.logo.as_str())
	.bind(item.genres.as_slice())
	.bind(item.countries.as_slice())
	.bind(persons.as_slice())
	.bind(item.rating)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_epg_item(db: &Db, item: &EpgItem) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO epg_items (name, description, channel_id, start_time, end_time)
VALUES ($1,$2,$3,$4,$5)",
	)
	.bind(item.name.as_str())
	.bind(item.description.as_str())
	.bind(item.channel_id)
	.bind(item.start_time)
	.bind(item.end_time)
	.execute(&db.pool)
	.await?;

	Ok(())
}

fn build_search(
	layout: &IndexLayout,
	query: &SearchQuery,
	fuzzy_threshold: f32,
) -> Result<Option<QueryBuilder<'static, Postgres>>> {
	if query.index != layout.index {
		return Err(Error::InvalidArgument(format!(
			"Query for index {} cannot run against {}.",
			query.index, layout.table
		)));
	}

	let terms = fulltext::parse(&query.full_text)?;

	if terms.is_empty() {
		tracing::debug!(index = %query.index, "Full-text expression has no terms; nothing to match.");

		return Ok(None);
	}

	let mut builder = QueryBuilder::new("SELECT ");

	builder.push(layout.select);
	builder.push(", (");
	push_score(&mut builder, layout, &terms)?;
	builder.push(")::real AS relevancy FROM ");
	builder.push(layout.table);
	builder.push(" WHERE TRUE");

	for filter in &query.filters {
		builder.push(" AND ");
		push_filter(&mut builder, layout, filter)?;
	}

	let (required, optional): (Vec<&Term>, Vec<&Term>) = terms.iter().partition(|term| term.required);

	for term in &required {
		builder.push(" AND ");
		push_match(&mut builder, layout, term, fuzzy_threshold)?;
	}

	if required.is_empty() {
		builder.push(" AND (");

		for (i, term) in optional.iter().enumerate() {
			if i > 0 {
				builder.push(" OR ");
			}

			push_match(&mut builder, layout, term, fuzzy_threshold)?;
		}

		builder.push(")");
	}

	builder.push(" ORDER BY ");

	match &query.sort {
		Some(sort) => {
			builder.push(sort_column(layout, &sort.field)?);
			builder.push(if sort.descending { " DESC NULLS LAST" } else { " ASC NULLS LAST" });
			builder.push(", relevancy DESC");
		},
		None => {
			builder.push("relevancy DESC");
		},
	}

	builder.push(", ");
	builder.push(layout.tie_breaker);
	builder.push(" LIMIT ");
	builder.push_bind(i64::from(query.limit));

	Ok(Some(builder))
}

fn push_score(
	builder: &mut QueryBuilder<'static, Postgres>,
	layout: &IndexLayout,
	terms: &[Term],
) -> Result<()> {
	let mut first = true;

	for term in terms {
		for boost in &term.fields {
			let expr = text_expr(layout, &boost.field)?;

			if !first {
				builder.push(" + ");
			}

			first = false;

			if term.fuzzy {
				builder.push_bind(boost.weight);
				builder.push(" * word_similarity(");
				builder.push_bind(term.text.clone());
				builder.push(", ");
				builder.push(expr);
				builder.push(")");
			} else {
				builder.push("CASE WHEN ");
				builder.push(expr);
				builder.push(" ILIKE ");
				builder.push_bind(like_pattern(&term.text));
				builder.push(" THEN ");
				builder.push_bind(boost.weight);
				builder.push(" ELSE 0 END");
			}
		}
	}

	Ok(())
}

fn push_match(
	builder: &mut QueryBuilder<'static, Postgres>,
	layout: &IndexLayout,
	term: &Term,
	fuzzy_threshold: f32,
) -> Result<()> {
	builder.push("(");

	for (i, boost) in term.fields.iter().enumerate() {
		let expr = text_expr(layout, &boost.field)?;

		if i > 0 {
			builder.push(" OR ");
		}

		if term.fuzzy {
			builder.push("word_similarity(");
			builder.push_bind(term.text.clone());
			builder.push(", ");
			builder.push(expr);
			builder.push(") >= ");
			builder.push_bind(fuzzy_threshold);
		} else {
			builder.push(expr);
			builder.push(" ILIKE ");
			builder.push_bind(like_pattern(&term.text));
		}
	}

	builder.push(")");

	Ok(())
}

fn push_filter(
	builder: &mut QueryBuilder<'static, Postgres>,
	layout: &IndexLayout,
	filter: &Filter,
) -> Result<()> {
	let Some((_, column, kind)) =
		layout.filter_columns.iter().find(|(field, _, _)| *field == filter.field)
	else {
		return Err(Error::InvalidArgument(format!(
			"Field {:?} is not filterable on {}.",
			filter.field, layout.table
		)));
	};

	let op = match filter.op {
		Operator::Eq => " = ",
		Operator::Gt => " > ",
		Operator::Ge => " >= ",
		Operator::Lt => " < ",
		Operator::Le => " <= ",
		Operator::Empty => {
			let zero = match kind {
				ColumnKind::Int => "0",
				ColumnKind::Text => "''",
			};

			builder.push(format!("({column} IS NULL OR {column} = {zero})"));

			return Ok(());
		},
	};

	builder.push(*column);
	builder.push(op);

	match (kind, &filter.value) {
		(ColumnKind::Int, FilterValue::Int(value)) => {
			builder.push_bind(*value);
		},
		(ColumnKind::Text, FilterValue::Text(value)) => {
			builder.push_bind(value.clone());
		},
		_ => {
			return Err(Error::InvalidArgument(format!(
				"Field {:?} on {} does not accept value {:?}.",
				filter.field, layout.table, filter.value
			)));
		},
	}

	Ok(())
}

fn text_expr(layout: &IndexLayout, field: &str) -> Result<&'static str> {
	if field == ALL_FIELDS {
		return Ok(layout.all_fields);
	}

	layout.text_fields
		.iter()
		.find(|(name, _)| *name == field)
		.map(|(_, expr)| *expr)
		.ok_or_else(|| {
			Error::InvalidArgument(format!("Field {field:?} is not searchable on {}.", layout.table))
		})
}

fn sort_column(layout: &IndexLayout, field: &str) -> Result<&'static str> {
	layout.sort_columns
		.iter()
		.find(|(name, _)| *name == field)
		.map(|(_, column)| *column)
		.ok_or_else(|| {
			Error::InvalidArgument(format!("Field {field:?} is not sortable on {}.", layout.table))
		})
}

fn like_pattern(text: &str) -> String {
	let mut out = String::with_capacity(text.len() + 2);

	out.push('%');

	for c in text.chars() {
		if matches!(c, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(c);
	}

	out.push('%');

	out
}
