//! Integration tests for the HTTP debug API
//!
//! Tests endpoint contracts via tower's oneshot, like a client would.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use whispergate::core::create_router;

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["rooms_active"], 0);
}

#[tokio::test]
async fn test_create_room_defaults() {
    let app = create_router();

    let response = app
        .oneshot(post_json("/room/new", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["room_id"].is_string());
    assert!(json["websocket_url"].is_string());
    assert_eq!(json["participant_ids"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_room_requires_two_participants() {
    let app = create_router();

    let response = app
        .oneshot(post_json("/room/new", r#"{"participants": ["alone"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_room_not_found() {
    let app = create_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/room/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_scripted_flow() {
    let app = create_router();

    // Create a room
    let response = app
        .clone()
        .oneshot(post_json(
            "/room/new",
            r#"{"participants": ["alice", "bob", "carol"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();

    // Initial status: frame 0, nobody whispering
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/room/{}", room_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["frame"], 0);
    assert_eq!(status["participants"].as_array().unwrap().len(), 3);

    // Step through the apart phase into a second of whispering
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/room/{}/step", room_id),
            r#"{"frames": 108}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stepped = body_json(response).await;
    assert_eq!(stepped["frame"], 108);

    let participants = stepped["participants"].as_array().unwrap();
    let alice = &participants[0];
    let bob = &participants[1];
    let carol = &participants[2];
    assert_eq!(alice["whispering"], true, "scripted speaker whispers");
    assert_eq!(bob["receiving"], true, "scripted listener receives");
    assert_eq!(carol["receiving"], false, "bystander stays out");

    // Gate introspection names the pair
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/room/{}/gates", room_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let gates = body_json(response).await;
    let slots = gates["slots"].as_array().unwrap();
    let active: Vec<&Value> = slots.iter().filter(|s| s["gate_on"] == true).collect();
    assert_eq!(active.len(), 1);
    assert!(gates["hud"].as_str().unwrap().contains("Whisper Gates"));
}

#[tokio::test]
async fn test_step_past_script_end_is_safe() {
    let app = create_router();

    let response = app
        .clone()
        .oneshot(post_json("/room/new", "{}"))
        .await
        .unwrap();
    let created = body_json(response).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();

    // The demo script is 324 frames; run well past it
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/room/{}/step", room_id),
            r#"{"frames": 600}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stepped = body_json(response).await;
    assert_eq!(stepped["script_done"], true);

    // Everything has settled back to idle
    let participants = stepped["participants"].as_array().unwrap();
    for p in participants {
        assert_eq!(p["whispering"], false);
        assert_eq!(p["receiving"], false);
    }
}
