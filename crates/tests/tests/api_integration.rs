use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use haven_api::build_app;
use haven_core::respond::{EMERGENCY_MESSAGE, SUPPORT_MESSAGE};
use serde_json::json;
use tower::ServiceExt;

fn chat_request(message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

fn wall_post_request(message: &str, mood: Option<&str>) -> Request<Body> {
    let mut payload = json!({ "message": message });
    if let Some(mood) = mood {
        payload["mood"] = json!(mood);
    }

    Request::builder()
        .method("POST")
        .uri("/v1/wall/posts")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_capabilities() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["capabilities"]["wall_available"], true);
    assert_eq!(parsed["capabilities"]["responder"], "scripted");
}

#[tokio::test]
async fn emergency_chat_turn_bypasses_the_generator() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request("I feel hopeless and want to die"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["crisis"], true);
    assert_eq!(parsed["emergency"], true);
    assert_eq!(parsed["degraded"], false);
    assert_eq!(parsed["response"], EMERGENCY_MESSAGE);
    assert_eq!(parsed["resources"]["title"], "Immediate Crisis Support");
    assert_eq!(
        parsed["resources"]["entries"].as_array().map(Vec::len),
        Some(3)
    );
}

#[tokio::test]
async fn support_chat_turn_concatenates_fixed_copy_and_generated_reply() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request("I'm anxious about my exam"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["crisis"], true);
    assert_eq!(parsed["emergency"], false);

    let reply = parsed["response"].as_str().unwrap();
    assert!(reply.starts_with(SUPPORT_MESSAGE));
    assert!(reply.contains("\n\n"));
    assert!(reply.contains("Anxiety can feel overwhelming"));
    assert_eq!(parsed["resources"]["title"], "Mental Health Support");
}

#[tokio::test]
async fn plain_chat_turn_has_no_resources() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(chat_request("I planted tomatoes today"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["crisis"], false);
    assert_eq!(parsed["emergency"], false);
    assert!(parsed.get("resources").is_none());
}

#[tokio::test]
async fn blank_chat_message_is_a_validation_failure() {
    let app = build_app().await.expect("app should build");

    let response = app.oneshot(chat_request("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wall_post_round_trips_through_the_store() {
    let app = build_app().await.expect("app should build");

    let created = app
        .clone()
        .oneshot(wall_post_request(
            "Sending strength to whoever needs it tonight",
            Some("hopeful"),
        ))
        .await
        .unwrap();

    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["expiresInSeconds"], 3600);
    assert_eq!(created["post"]["mood"], "hopeful");
    assert!(created["post"]["createdAt"].is_string());
    assert!(created["post"]["expiresAt"].is_string());

    let listed = app
        .oneshot(
            Request::builder()
                .uri("/v1/wall/posts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(listed.status(), StatusCode::OK);
    let listed = body_json(listed).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(
        listed["posts"][0]["message"],
        "Sending strength to whoever needs it tonight"
    );
}

#[tokio::test]
async fn oversize_wall_post_is_rejected_and_not_stored() {
    let app = build_app().await.expect("app should build");

    let response = app
        .clone()
        .oneshot(wall_post_request(&"a".repeat(501), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let parsed = body_json(response).await;
    assert_eq!(parsed["reason"], "Message too long");

    let listed = app
        .oneshot(
            Request::builder()
                .uri("/v1/wall/posts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(listed).await;
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn crisis_wall_post_is_redirected_to_private_chat() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(wall_post_request("I feel hopeless", Some("sad")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let parsed = body_json(response).await;
    assert_eq!(
        parsed["reason"],
        "Crisis content should be handled privately through chat"
    );
    assert_eq!(
        parsed["suggestion"],
        "Please use the private chat feature for personal support"
    );
}

#[tokio::test]
async fn empty_wall_post_is_a_validation_failure() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(wall_post_request("   ", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wall_stats_aggregate_the_current_snapshot() {
    let app = build_app().await.expect("app should build");

    for (message, mood) in [
        ("One day at a time", Some("calm")),
        ("Proud of a small win today", Some("hopeful")),
        ("Quiet evening walk helped", Some("calm")),
    ] {
        let response = app
            .clone()
            .oneshot(wall_post_request(message, mood))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/wall/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["totalPosts"], 3);
    assert_eq!(parsed["moodDistribution"]["calm"], 2);
    assert_eq!(parsed["moodDistribution"]["hopeful"], 1);
    assert_eq!(parsed["timeDistribution"]["last15min"], 3);
    assert_eq!(parsed["timeDistribution"]["last30min"], 3);
    assert_eq!(parsed["timeDistribution"]["last60min"], 3);
}

#[tokio::test]
async fn wall_sweep_reports_reclaimed_entries() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/wall/sweep")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["removed"], 0);
}
