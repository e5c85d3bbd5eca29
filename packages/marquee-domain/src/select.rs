use rand::Rng;

/// Picks the answer out of a backend result list.
///
/// Relevancy-ranked lists are trusted as ordered best first. Otherwise every candidate is equally
/// likely, so repeated category requests rotate through the top of the rating-sorted list.
pub fn select<T, R>(mut candidates: Vec<T>, rank_by_relevancy: bool, rng: &mut R) -> Option<T>
where
	R: Rng + ?Sized,
{
	if candidates.is_empty() {
		return None;
	}
	if rank_by_relevancy {
		return candidates.into_iter().next();
	}

	let index = rng.gen_range(0..candidates.len());

	Some(candidates.swap_remove(index))
}
