//! Validator report against a local server publishing good and bad cards

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use parley_cli::validate::{Verdict, run};

fn card() -> Value {
    json!({
        "name": "Insurance Auth Specialist",
        "description": "Reviews prior authorization requests for imaging",
        "url": "https://example.org/api/bridge/abc/a2a",
        "version": "1.0.0",
        "iconUrl": null,
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "capabilities": {"streaming": false},
        "skills": [{
            "id": "review",
            "name": "Review",
            "description": "Checks a request against policy",
            "tags": ["insurance"]
        }],
        "provider": {"organization": "Example Health", "url": "https://example.org"}
    })
}

async fn serve() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let mut broken = card();
    broken.as_object_mut().unwrap().remove("url");
    broken["skills"][0]["id"] = json!(5);

    let app = Router::new()
        .route("/good.json", get(|| async { Json(card()) }))
        .route(
            "/bad.json",
            get(move || {
                let broken = broken.clone();
                async move { Json(broken) }
            }),
        )
        .route(
            "/down.json",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route("/garbage.json", get(|| async { "not json {" }));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

async fn report(url: &str) -> (Verdict, String) {
    let mut out = Vec::new();
    let verdict = run(url, Duration::from_secs(5), &mut out).await.unwrap();
    (verdict, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_valid_card_passes() {
    let base = serve().await;
    let (verdict, text) = report(&format!("{}/good.json", base)).await;
    assert_eq!(verdict, Verdict::Passed);

    assert!(text.contains("✓ Successfully fetched agent card\n  Response status: 200"));
    assert!(text.contains("✅ VALIDATION PASSED"));
    assert!(text.contains("  Name: Insurance Auth Specialist"));
    assert!(text.contains("  Protocol Version: 0.3.0"));
    assert!(text.contains("  Organization: Example Health"));
    assert!(text.contains("  - Review (id: review)"));

    let (_, model) = text
        .split_once("Full Validated Model (as JSON):")
        .expect("model section missing");
    assert!(model.contains("\"preferredTransport\": \"JSONRPC\""));
    assert!(model.contains("\"streaming\": false"));
    assert!(!model.contains("iconUrl"));
    assert!(!model.contains("null"));
}

#[tokio::test]
async fn test_invalid_card_lists_every_error() {
    let base = serve().await;
    let (verdict, text) = report(&format!("{}/bad.json", base)).await;
    assert_eq!(verdict, Verdict::Failed);

    assert!(text.contains("❌ VALIDATION FAILED"));
    assert!(text.contains("Validation errors (2):"));
    assert!(text.contains(
        "\n1. Field: skills → 0 → id\n   Error: Input should be a valid string\n   Input value: 5\n"
    ));
    assert!(text.contains("\n2. Field: url\n   Error: Field required\n"));
    assert!(!text.contains("VALIDATION PASSED"));

    let (_, raw) = text.split_once("Raw JSON received:").expect("raw section missing");
    assert!(raw.contains("\"id\": 5"));
    assert!(raw.contains("\"iconUrl\": null"));
}

#[tokio::test]
async fn test_http_error_reported() {
    let base = serve().await;
    let (verdict, text) = report(&format!("{}/down.json", base)).await;
    assert_eq!(verdict, Verdict::Error);
    assert!(text.contains(
        "❌ ERROR: HTTP error occurred\n   Status code: 503\n   Response: maintenance\n"
    ));
    assert!(!text.contains("Successfully fetched"));
}

#[tokio::test]
async fn test_invalid_json_reported() {
    let base = serve().await;
    let (verdict, text) = report(&format!("{}/garbage.json", base)).await;
    assert_eq!(verdict, Verdict::Error);
    assert!(text.contains("❌ ERROR: Invalid JSON response\n   Details: "));
}
