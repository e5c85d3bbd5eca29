use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use time::{Duration, OffsetDateTime};

use marquee_domain::slot::{SlotName, SlotSet, SlotValue};

/// When an untouched session stops being worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
	pub idle_ttl: Option<Duration>,
}
impl ExpiryPolicy {
	pub fn never() -> Self {
		Self { idle_ttl: None }
	}

	pub fn idle(ttl: Duration) -> Self {
		Self { idle_ttl: Some(ttl) }
	}

	pub fn from_config(cfg: &marquee_config::Sessions) -> Self {
		match cfg.idle_ttl_seconds {
			0 => Self::never(),
			seconds => Self::idle(Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))),
		}
	}

	pub fn is_expired(&self, last_seen: OffsetDateTime, now: OffsetDateTime) -> bool {
		self.idle_ttl.is_some_and(|ttl| now - last_seen > ttl)
	}
}

#[derive(Debug)]
struct SessionEntry {
	slots: SlotSet,
	last_seen: OffsetDateTime,
}

/// Per-conversation slot state shared by all request handlers.
///
/// Every operation takes the table lock once and never awaits while holding it.
#[derive(Debug)]
pub struct SessionStore {
	entries: Mutex<HashMap<String, SessionEntry>>,
	policy: ExpiryPolicy,
}
impl SessionStore {
	pub fn new(policy: ExpiryPolicy) -> Self {
		Self { entries: Mutex::new(HashMap::new()), policy }
	}

	pub fn policy(&self) -> ExpiryPolicy {
		self.policy
	}

	/// Folds one turn's slots into the session and returns the resulting state.
	///
	/// An expired entry that the sweeper has not reached yet is replaced, not merged into.
	pub fn merge(&self, session: &str, incoming: &SlotSet, now: OffsetDateTime) -> SlotSet {
		let mut entries = self.lock();

		if let Some(entry) = entries.get_mut(session)
			&& !self.policy.is_expired(entry.last_seen, now)
		{
			entry.slots.merge(incoming);
			entry.last_seen = now;

			return entry.slots.clone();
		}

		entries.insert(session.to_string(), SessionEntry { slots: incoming.clone(), last_seen: now });

		incoming.clone()
	}

	pub fn get(&self, session: &str, slot: SlotName) -> SlotValue {
		self.lock().get(session).map(|entry| entry.slots.get(slot).clone()).unwrap_or_default()
	}

	pub fn snapshot(&self, session: &str) -> Option<SlotSet> {
		self.lock().get(session).map(|entry| entry.slots.clone())
	}

	/// Drops everything known about the session. Returns whether there was anything to drop.
	pub fn reset(&self, session: &str) -> bool {
		self.lock().remove(session).is_some()
	}

	/// Removes idle sessions according to the policy and returns how many went away.
	pub fn evict_idle(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.lock();
		let before = entries.len();

		entries.retain(|_, entry| !self.policy.is_expired(entry.last_seen, now));

		before - entries.len()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
		self.entries.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl Default for SessionStore {
	fn default() -> Self {
		Self::new(ExpiryPolicy::never())
	}
}
