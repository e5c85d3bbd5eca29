use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{Error, MarqueeService, Result, reply};
use marquee_domain::{
	query,
	select,
	slot::{SlotName, SlotSet, SlotValue},
};
use marquee_storage::models::MediaItem;

/// One user utterance as delivered by the dialog platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TurnRequest {
	pub session_id: String,
	#[serde(default)]
	pub text: String,
	/// Raw platform parameters keyed by slot parameter name.
	#[serde(default)]
	pub slots: Map<String, Value>,
	#[serde(default)]
	pub intent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResponse {
	pub spoken_text: String,
	pub item: Option<MediaItem>,
}
impl TurnResponse {
	fn text(spoken_text: &str) -> Self {
		Self { spoken_text: spoken_text.to_string(), item: None }
	}
}

impl MarqueeService {
	pub async fn handle_turn(&self, req: TurnRequest) -> Result<TurnResponse> {
		let session = req.session_id.trim();

		if session.is_empty() {
			return Err(Error::MalformedTurn {
				message: "Conversation key must be non-empty.".to_string(),
			});
		}

		if self.is_reset_intent(&req.intent) {
			let had_state = self.sessions.reset(session);

			tracing::info!(session, had_state, "Session reset.");

			return Ok(TurnResponse::text(reply::SESSION_RESET));
		}

		let incoming = decode_slots(session, &req.slots);
		let slots = self.sessions.merge(session, &incoming, OffsetDateTime::now_utc());
		let compiled = query::compile(&slots, &req.text, &self.cfg.search);

		tracing::debug!(
			session,
			intent = %req.intent,
			full_text = %compiled.full_text,
			rank_by_relevancy = compiled.rank_by_relevancy,
			fallback = compiled.is_fallback(),
			"Compiled turn query."
		);

		let candidates = self
			.search_or_empty(&compiled.to_search_query())
			.await
			.into_iter()
			.filter_map(|record| record.into_media())
			.collect::<Vec<_>>();
		let picked = self.with_rng_mut(|rng| {
			select::select(candidates, compiled.rank_by_relevancy, rng)
		});
		let Some(item) = picked else {
			return Ok(TurnResponse::text(reply::NOTHING_FOUND));
		};

		Ok(TurnResponse { spoken_text: reply::recommendation(&item), item: Some(item) })
	}

	fn is_reset_intent(&self, intent: &str) -> bool {
		let intent = intent.trim();

		self.cfg.intents.reset.iter().any(|reset| reset == intent)
	}
}

/// Reads the recognized slots out of raw platform parameters.
///
/// Unknown parameter names are skipped. A value the slot cannot hold counts as not supplied.
pub fn decode_slots(session: &str, params: &Map<String, Value>) -> SlotSet {
	let mut slots = SlotSet::new();

	for (param, raw) in params {
		let Some(name) = SlotName::from_param(param) else {
			tracing::debug!(session, param = %param, "Ignoring unrecognized slot.");

			continue;
		};

		match SlotValue::decode(name, raw) {
			Ok(value) => slots.set(name, value),
			Err(err) => {
				tracing::warn!(session, param = %param, error = %err, "Ignoring slot value.");
			},
		}
	}

	slots
}
