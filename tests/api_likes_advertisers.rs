//! Like and advertiser endpoints

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::spawn_app;

#[tokio::test]
async fn test_second_like_from_same_ip_conflicts() {
    let app = spawn_app().await;
    let like = json!({ "listingId": "listing-1", "ip": "203.0.113.7" });

    let first = app.server.post("/api/likes").json(&like).await;
    first.assert_status(StatusCode::CREATED);
    assert_eq!(first.json::<Value>()["data"], json!({ "success": true, "total": 1 }));

    app.server
        .post("/api/likes")
        .json(&like)
        .await
        .assert_status(StatusCode::CONFLICT);

    let count = app.server.get("/api/likes/listing-1").await;
    count.assert_status_ok();
    assert_eq!(count.json::<Value>()["data"]["total"], 1);
}

#[tokio::test]
async fn test_like_ip_taken_from_forwarded_header() {
    let app = spawn_app().await;
    let forwarded = |ip: &'static str| {
        (
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static(ip),
        )
    };

    let (name, value) = forwarded("198.51.100.1, 10.0.0.1");
    app.server
        .post("/api/likes")
        .add_header(name, value)
        .json(&json!({ "listingId": "listing-2" }))
        .await
        .assert_status(StatusCode::CREATED);

    let (name, value) = forwarded("198.51.100.2");
    let response = app
        .server
        .post("/api/likes")
        .add_header(name, value)
        .json(&json!({ "listingId": "listing-2" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["data"]["total"], 2);

    let (name, value) = forwarded("198.51.100.1");
    app.server
        .post("/api/likes")
        .add_header(name, value)
        .json(&json!({ "listingId": "listing-2" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_like_without_listing_is_rejected() {
    let app = spawn_app().await;
    app.server
        .post("/api/likes")
        .json(&json!({ "ip": "203.0.113.7" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let count = app.server.get("/api/likes/unknown").await.json::<Value>();
    assert_eq!(count["data"]["total"], 0);
}

#[tokio::test]
async fn test_advertiser_registration_hides_password() {
    let app = spawn_app().await;
    let response = app
        .server
        .post("/api/advertisers")
        .json(&json!({
            "name": "Viação Sul Ltda",
            "phone": "+55 41 99999-0000",
            "email": "vendas@viacaosul.com.br",
            "document": "12.345.678/0001-90",
            "location": { "city": "Curitiba", "state": "PR" },
            "password": "hunter22"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let advertiser = response.json::<Value>()["data"].clone();
    assert_eq!(advertiser["name"], "Viação Sul Ltda");
    assert!(advertiser["id"].as_str().is_some());
    assert!(advertiser.get("password").is_none());
    assert!(advertiser.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_advertiser_requires_contact_details() {
    let app = spawn_app().await;
    app.server
        .post("/api/advertisers")
        .json(&json!({ "name": "Nameless" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let health = app.server.get("/healthz").await;
    health.assert_status_ok();
    assert_eq!(health.text(), "ok");
    assert_eq!(health.header("x-content-type-options"), "nosniff");

    let banner = app.server.get("/").await;
    banner.assert_status_ok();
    assert!(banner.text().starts_with("webbuses"));
}
