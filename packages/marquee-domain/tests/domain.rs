use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use marquee_config::Search;
use marquee_domain::{
	query::{self, FIELD_RATING, FIELD_YEAR, YearRange},
	search::{Filter, Operator, SearchIndex},
	select,
	slot::{SlotName, SlotSet, SlotValue},
};

fn search_cfg() -> Search {
	Search { filtered_limit: 100, relevancy_limit: 10, ..Default::default() }
}

fn slots(pairs: &[(SlotName, &str)]) -> SlotSet {
	pairs.iter().map(|(name, value)| (*name, SlotValue::text(*value))).collect()
}

#[test]
fn merging_same_value_twice_is_idempotent() {
	let incoming = slots(&[(SlotName::Genre, "comedy")]);
	let mut once = SlotSet::new();

	once.merge(&incoming);

	let mut twice = once.clone();

	twice.merge(&incoming);

	assert_eq!(once, twice);
}

#[test]
fn empty_values_never_overwrite() {
	let mut state = slots(&[(SlotName::Genre, "comedy")])
		.with(SlotName::Period, SlotValue::period(Some("2001-01-01T00:00:00Z".to_string()), None));
	let before = state.clone();
	let incoming: SlotSet = [
		(SlotName::Genre, SlotValue::text("")),
		(SlotName::Period, SlotValue::period(None, None)),
	]
	.into_iter()
	.collect();

	state.merge(&incoming);

	assert_eq!(state, before);
}

#[test]
fn new_value_overwrites_previous() {
	let mut state = slots(&[(SlotName::Genre, "comedy"), (SlotName::Origin, "France")]);

	state.merge(&slots(&[(SlotName::Genre, "horror")]));

	assert_eq!(state.text(SlotName::Genre), Some("horror"));
	assert_eq!(state.text(SlotName::Origin), Some("France"));
}

#[test]
fn later_turn_can_fill_a_slot_missing_at_start() {
	let mut state = slots(&[(SlotName::Genre, "comedy")]);

	state.merge(&slots(&[(SlotName::Origin, "USA")]));

	assert_eq!(state.text(SlotName::Genre), Some("comedy"));
	assert_eq!(state.text(SlotName::Origin), Some("USA"));
}

#[test]
fn unknown_slots_read_as_absent() {
	let state = SlotSet::new();

	for slot in SlotName::ALL {
		assert_eq!(state.get(slot), &SlotValue::Absent);
	}
}

#[test]
fn filter_only_query_ranks_by_rating() {
	let compiled = query::compile(&slots(&[(SlotName::Genre, "comedy")]), "something funny", &search_cfg());

	assert_eq!(compiled.full_text, "@genres_names^1 +comedy~");
	assert!(!compiled.rank_by_relevancy);
	assert_eq!(compiled.limit, 100);
	assert_eq!(compiled.clauses, vec![SlotName::Genre]);

	let request = compiled.to_search_query();

	assert_eq!(request.index, SearchIndex::MediaItems);
	assert_eq!(request.sort.as_ref().map(|sort| sort.field.as_str()), Some(FIELD_RATING));
	assert!(request.sort.as_ref().is_some_and(|sort| sort.descending));
	assert_eq!(request.filters[0], Filter::eq("type", "film"));
	assert_eq!(request.filters[1], Filter::empty("parent_id"));
}

#[test]
fn every_filter_slot_adds_a_required_fuzzy_clause() {
	let compiled = query::compile(
		&slots(&[
			(SlotName::Genre, "science fiction"),
			(SlotName::Origin, "USA"),
			(SlotName::Persons, "Tom Hanks"),
		]),
		"",
		&search_cfg(),
	);

	assert_eq!(
		compiled.full_text,
		"@genres_names^1 +science~ +fiction~ @countries^1 +usa~ @persons_names^1 +tom~ +hanks~"
	);
	assert!(!compiled.rank_by_relevancy);
}

#[test]
fn title_switches_to_relevancy_ranking() {
	let compiled = query::compile(
		&slots(&[(SlotName::Genre, "thriller"), (SlotName::Name, "Inception")]),
		"",
		&search_cfg(),
	);

	assert!(compiled.rank_by_relevancy);
	assert!(compiled.full_text.ends_with("@name^1 +inception~"));
	assert_eq!(compiled.limit, 10);
	assert_eq!(compiled.to_search_query().sort, None);
}

#[test]
fn no_filters_falls_back_to_free_text() {
	let compiled = query::compile(&SlotSet::new(), "Покажи что-нибудь про космос", &search_cfg());

	assert!(compiled.is_fallback());
	assert!(compiled.rank_by_relevancy);
	assert_eq!(compiled.full_text, "@*^0.3,name^1.1 покажи что нибудь про космос");
}

#[test]
fn ranking_mode_is_deterministic() {
	let cases = [
		(slots(&[]), true),
		(slots(&[(SlotName::Origin, "Italy")]), false),
		(slots(&[(SlotName::Persons, "Fellini")]), false),
		(slots(&[(SlotName::Name, "Amarcord")]), true),
		(slots(&[(SlotName::Origin, "Italy"), (SlotName::Name, "Amarcord")]), true),
	];

	for (input, expected) in cases {
		for _ in 0..3 {
			assert_eq!(query::compile(&input, "text", &search_cfg()).rank_by_relevancy, expected);
		}
	}
}

#[test]
fn period_becomes_inclusive_year_filters() {
	let state = slots(&[(SlotName::Genre, "drama")]).with(
		SlotName::Period,
		SlotValue::period(
			Some("1980-01-01T00:00:00Z".to_string()),
			Some("1989-12-31T23:59:59Z".to_string()),
		),
	);
	let compiled = query::compile(&state, "", &search_cfg());

	assert_eq!(compiled.years, YearRange { from: Some(1980), to: Some(1989) });

	let filters = compiled.to_search_query().filters;

	assert!(filters.contains(&Filter::int(FIELD_YEAR, Operator::Ge, 1980)));
	assert!(filters.contains(&Filter::int(FIELD_YEAR, Operator::Le, 1989)));
}

#[test]
fn malformed_period_only_drops_that_bound() {
	let state = slots(&[(SlotName::Genre, "drama")]).with(
		SlotName::Period,
		SlotValue::period(Some("yesterday".to_string()), Some("2000-05-05T00:00:00Z".to_string())),
	);
	let filters = query::compile(&state, "", &search_cfg()).to_search_query().filters;

	assert_eq!(filters.iter().filter(|filter| filter.field == FIELD_YEAR).count(), 1);
	assert!(filters.contains(&Filter::int(FIELD_YEAR, Operator::Le, 2000)));
}

#[test]
fn selector_handles_boundaries() {
	let mut rng = ChaCha8Rng::seed_from_u64(7);

	assert_eq!(select::select(Vec::<u32>::new(), true, &mut rng), None);
	assert_eq!(select::select(Vec::<u32>::new(), false, &mut rng), None);
	assert_eq!(select::select(vec![5], true, &mut rng), Some(5));
	assert_eq!(select::select(vec![5], false, &mut rng), Some(5));
	assert_eq!(select::select(vec![1, 2, 3], true, &mut rng), Some(1));
}

#[test]
fn selector_is_reproducible_for_a_seed() {
	let candidates = (0..50).collect::<Vec<u32>>();
	let picks = |seed| {
		let mut rng = ChaCha8Rng::seed_from_u64(seed);

		(0..10).map(|_| select::select(candidates.clone(), false, &mut rng)).collect::<Vec<_>>()
	};

	assert_eq!(picks(42), picks(42));
}

#[test]
fn selector_spreads_picks_uniformly() {
	const CANDIDATES: usize = 5;
	const TRIALS: usize = 20_000;

	let mut rng = ChaCha8Rng::seed_from_u64(2024);
	let mut counts = [0_usize; CANDIDATES];

	for _ in 0..TRIALS {
		let pick = select::select((0..CANDIDATES).collect(), false, &mut rng)
			.expect("Non-empty candidates always yield a pick.");

		counts[pick] += 1;
	}

	let expected = TRIALS / CANDIDATES;

	for count in counts {
		assert!(count.abs_diff(expected) < expected / 10, "Skewed distribution: {counts:?}.");
	}
}
