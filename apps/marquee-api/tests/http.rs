use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use marquee_api::{routes, state::AppState};
use marquee_domain::search::{SearchIndex, SearchQuery};
use marquee_service::{BoxFuture, MarqueeService, Record, Result, SearchBackend};
use marquee_storage::models::{EpgItem, MediaItem, Person};

const CONFIG: &str = r#"
[service]
http_bind = "127.0.0.1:0"

[storage.postgres]
dsn            = "postgres://unused"
pool_max_conns = 1

[search]
rng_seed = 11

[presentation]
image_base_url     = "https://img.test/"
open_url_base      = "https://watch.test/item/"
subtitle_max_chars = 10
"#;

/// Answers film queries with one film and programme queries with one programme.
struct FixedBackend;
impl SearchBackend for FixedBackend {
	fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<Record>>> {
		Box::pin(async move {
			let records = match query.index {
				SearchIndex::MediaItems => vec![Record::Media(MediaItem {
					id: 7,
					name: "Брат".to_string(),
					short_description: "Демобилизованный Данила приезжает в Петербург.".to_string(),
					year: Some(1997),
					logo: "/posters/7.jpg".to_string(),
					genres: vec!["драма".to_string()],
					countries: vec!["Россия".to_string()],
					persons: vec![Person { name: "Алексей Балабанов".to_string() }],
					rating: 8.3,
				})],
				SearchIndex::Epg => vec![Record::Epg(EpgItem {
					name: "Новости".to_string(),
					description: "Выпуск новостей".to_string(),
					channel_id: 3,
					start_time: 4_000_000_000,
					end_time: 4_000_001_800,
				})],
			};

			Ok(records)
		})
	}
}

struct EmptyBackend;
impl SearchBackend for EmptyBackend {
	fn search<'a>(&'a self, _query: &'a SearchQuery) -> BoxFuture<'a, Result<Vec<Record>>> {
		Box::pin(async move { Ok(Vec::new()) })
	}
}

fn app(backend: Arc<dyn SearchBackend>) -> (Router, AppState) {
	let config = marquee_config::parse(CONFIG).expect("Test config must parse.");
	let state = AppState::from_service(MarqueeService::with_backend(config, backend));

	(routes::router(state.clone()), state)
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri(uri)
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call the router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

fn webhook_payload(parameters: Value, intent: &str) -> Value {
	json!({
		"responseId": "r-1",
		"session": "projects/demo/agent/sessions/abc",
		"queryResult": {
			"queryText": "посоветуй драму",
			"parameters": parameters,
			"allRequiredParamsPresent": true,
			"outputContexts": [{
				"name": "projects/demo/agent/sessions/abc/contexts/find-movie-followup",
				"lifespanCount": 2,
				"parameters": {}
			}],
			"intent": {
				"name": "projects/demo/agent/intents/1",
				"displayName": intent
			},
			"intentDetectionConfidence": 1.0,
			"languageCode": "ru"
		}
	})
}

#[tokio::test]
async fn health_ok() {
	let (app, _) = app(Arc::new(EmptyBackend));
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhook_recommends_a_film_with_a_card() {
	let (app, state) = app(Arc::new(FixedBackend));
	let (status, json) =
		post_json(app, "/handler", webhook_payload(json!({ "movie-genre": "драма" }), "find-movie"))
			.await;
	let expected = "Рекомендую посмотреть Брат от Алексей Балабанов 1997 года";

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["fulfillmentText"], expected);
	assert_eq!(json["fulfillmentMessages"][0]["card"]["title"], "Брат");
	assert_eq!(json["fulfillmentMessages"][0]["card"]["subtitle"], "Демобилизо...");
	assert_eq!(json["fulfillmentMessages"][0]["card"]["imageUri"], "https://img.test/posters/7.jpg");
	assert_eq!(json["fulfillmentMessages"][0]["card"]["buttons"][0]["postback"], "https://watch.test/item/7");

	let google = &json["payload"]["google"];

	assert_eq!(google["expectUserResponse"], true);
	assert_eq!(google["richResponse"]["items"][0]["simpleResponse"]["textToSpeech"], expected);
	assert_eq!(google["richResponse"]["items"][1]["basicCard"]["imageDisplayOptions"], "WHITE");
	assert_eq!(
		google["richResponse"]["items"][1]["basicCard"]["buttons"][0]["openUrlAction"]["url"],
		"https://watch.test/item/7"
	);
	assert!(state.service.sessions.snapshot("projects/demo/agent/sessions/abc").is_some());
}

#[tokio::test]
async fn webhook_without_results_says_nothing_found() {
	let (app, _) = app(Arc::new(EmptyBackend));
	let (status, json) =
		post_json(app, "/handler", webhook_payload(json!({ "movie-name": "Несуществующий" }), "find-movie"))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["fulfillmentText"], "К сожалению, ничего не найдено");
	assert!(json.get("fulfillmentMessages").is_none());
	assert_eq!(json["payload"]["google"]["richResponse"]["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn webhook_reset_clears_the_conversation() {
	let (app, state) = app(Arc::new(FixedBackend));
	let (status, _) = post_json(
		app.clone(),
		"/handler",
		webhook_payload(json!({ "movie-genre": "драма" }), "find-movie"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);

	let (status, json) =
		post_json(app, "/handler", webhook_payload(json!({}), "find-movie - reset")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["fulfillmentText"], "Параметры сброшены");
	assert!(state.service.sessions.is_empty());
}

#[tokio::test]
async fn webhook_falls_back_to_session_field() {
	let (app, state) = app(Arc::new(FixedBackend));
	let mut payload = webhook_payload(json!({ "movie-genre": "драма" }), "find-movie");

	payload["queryResult"]["outputContexts"] = json!([{ "name": "no-marker-here" }]);
	payload["session"] = json!("session-42");

	let (status, _) = post_json(app, "/handler", payload).await;

	assert_eq!(status, StatusCode::OK);
	assert!(state.service.sessions.snapshot("session-42").is_some());
}

#[tokio::test]
async fn webhook_without_conversation_key_is_rejected() {
	let (app, _) = app(Arc::new(FixedBackend));
	let payload = json!({
		"queryResult": {
			"queryText": "что посмотреть",
			"parameters": {},
			"intent": { "displayName": "find-movie" }
		}
	});
	let (status, json) = post_json(app, "/handler", payload).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "malformed_turn");
	assert!(json["fields"].is_null());
}

#[tokio::test]
async fn epg_search_returns_programmes() {
	let (app, _) = app(Arc::new(FixedBackend));
	let (status, json) = post_json(app, "/v1/epg/search", json!({ "query": "новости" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"][0]["name"], "Новости");
	assert_eq!(json["items"][0]["channel_id"], 3);
}

#[tokio::test]
async fn epg_search_rejects_blank_query() {
	let (app, _) = app(Arc::new(FixedBackend));
	let (status, json) = post_json(app, "/v1/epg/search", json!({ "query": "  " })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
	assert_eq!(json["fields"][0], "$.query");
}
