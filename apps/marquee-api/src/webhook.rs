//! Dialog platform webhook payloads.
//!
//! Field names follow the platform's camelCase wire format. Only the parts a turn needs are
//! decoded; everything else in the request is ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use marquee_config::Presentation;
use marquee_service::{Error, Result, TurnRequest, TurnResponse};
use marquee_storage::models::MediaItem;

const CONTEXTS_MARKER: &str = "/contexts/";
const WATCH_BUTTON: &str = "Смотреть";
const IMAGE_DISPLAY_OPTIONS: &str = "WHITE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
	#[serde(default)]
	pub response_id: String,
	#[serde(default)]
	pub session: String,
	#[serde(default)]
	pub query_result: QueryResult,
}
impl WebhookRequest {
	/// The key under which slots accumulate for this conversation.
	///
	/// Output context names look like `<session path>/contexts/<context>`; the first one that
	/// carries the marker wins. The `session` field is the fallback.
	pub fn conversation_key(&self) -> Result<String> {
		let from_context = self.query_result.output_contexts.iter().find_map(|context| {
			context
				.name
				.split_once(CONTEXTS_MARKER)
				.map(|(prefix, _)| prefix.trim())
				.filter(|prefix| !prefix.is_empty())
		});

		if let Some(key) = from_context {
			return Ok(key.to_string());
		}

		let session = self.session.trim();

		if session.is_empty() {
			return Err(Error::MalformedTurn {
				message: "Request carries neither an output context nor a session.".to_string(),
			});
		}

		Ok(session.to_string())
	}

	pub fn into_turn(self) -> Result<TurnRequest> {
		let session_id = self.conversation_key()?;
		let QueryResult { query_text, parameters, intent, .. } = self.query_result;

		Ok(TurnRequest { session_id, text: query_text, slots: parameters, intent: intent.display_name })
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
	#[serde(default)]
	pub query_text: String,
	#[serde(default)]
	pub parameters: Map<String, Value>,
	#[serde(default)]
	pub output_contexts: Vec<OutputContext>,
	#[serde(default)]
	pub intent: Intent,
	#[serde(default)]
	pub language_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputContext {
	pub name: String,
	#[serde(default)]
	pub lifespan_count: i64,
	#[serde(default)]
	pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
	pub fulfillment_text: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub fulfillment_messages: Vec<FulfillmentMessage>,
	pub payload: Payload,
}
impl WebhookResponse {
	pub fn from_turn(turn: &TurnResponse, presentation: &Presentation) -> Self {
		let mut items = vec![RichItem::SimpleResponse(SimpleResponse {
			text_to_speech: turn.spoken_text.clone(),
		})];
		let mut fulfillment_messages = Vec::new();

		if let Some(item) = &turn.item {
			let links = Links::new(item, presentation);

			fulfillment_messages.push(FulfillmentMessage {
				card: FulfillmentCard {
					title: item.name.clone(),
					subtitle: truncate(&item.short_description, presentation.subtitle_max_chars),
					image_uri: links.image.clone(),
					buttons: vec![FulfillmentButton {
						text: WATCH_BUTTON.to_string(),
						postback: links.open.clone(),
					}],
				},
			});
			items.push(RichItem::BasicCard(BasicCard {
				title: item.name.clone(),
				image: Image { url: links.image, accessibility_text: item.name.clone() },
				buttons: vec![Button {
					title: WATCH_BUTTON.to_string(),
					open_url_action: OpenUrlAction { url: links.open },
				}],
				image_display_options: IMAGE_DISPLAY_OPTIONS.to_string(),
			}));
		}

		Self {
			fulfillment_text: turn.spoken_text.clone(),
			fulfillment_messages,
			payload: Payload {
				google: GooglePayload {
					expect_user_response: true,
					rich_response: RichResponse { items },
				},
			},
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct FulfillmentMessage {
	pub card: FulfillmentCard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentCard {
	pub title: String,
	pub subtitle: String,
	pub image_uri: String,
	pub buttons: Vec<FulfillmentButton>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FulfillmentButton {
	pub text: String,
	pub postback: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payload {
	pub google: GooglePayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayload {
	pub expect_user_response: bool,
	pub rich_response: RichResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct RichResponse {
	pub items: Vec<RichItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RichItem {
	SimpleResponse(SimpleResponse),
	BasicCard(BasicCard),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponse {
	pub text_to_speech: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicCard {
	pub title: String,
	pub image: Image,
	pub buttons: Vec<Button>,
	pub image_display_options: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
	pub url: String,
	pub accessibility_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
	pub title: String,
	pub open_url_action: OpenUrlAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenUrlAction {
	pub url: String,
}

struct Links {
	image: String,
	open: String,
}
impl Links {
	fn new(item: &MediaItem, presentation: &Presentation) -> Self {
		let logo = item.logo.trim();
		let image = if logo.is_empty() || logo.starts_with('/') {
			format!("{}{logo}", presentation.image_base_url)
		} else {
			format!("{}/{logo}", presentation.image_base_url)
		};

		Self { image, open: format!("{}{}", presentation.open_url_base, item.id) }
	}
}

/// Cuts `text` to `max_chars` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((end, _)) => format!("{}...", &text[..end]),
		None => text.to_string(),
	}
}
