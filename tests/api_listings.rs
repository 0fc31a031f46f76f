//! Listing endpoints over an in-memory SQLite database

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};
use std::time::Duration;

use common::{create_listing, listing_body, png_bytes, spawn_app, spawn_app_with};
use webbuses::config::Config;
use webbuses::images::encode_data_uri;

const PHOTO: &str = "https://img.example.com/bus-front.jpg";

#[tokio::test]
async fn test_cover_falls_back_to_first_gallery_image() {
    let app = spawn_app().await;
    let id = create_listing(&app, &listing_body("Viação Sul", &[PHOTO, "https://img.example.com/b.jpg"])).await;

    let response = app.server.get(&format!("/api/listings/{id}")).await;
    response.assert_status_ok();
    let listing = response.json::<Value>()["data"].clone();
    assert_eq!(listing["coverImageUrl"], PHOTO);
    assert_eq!(listing["status"], "pending");
    assert_eq!(listing["location"]["city"], "Curitiba");
}

#[tokio::test]
async fn test_cover_falls_back_to_placeholder() {
    let mut config = Config::default();
    config.listings.require_cover_on_create = false;
    let placeholder = config.listings.cover_placeholder.clone();
    let app = spawn_app_with(config).await;

    let id = create_listing(&app, &listing_body("Sem Foto", &[])).await;
    let listing = app
        .server
        .get(&format!("/api/listings/{id}"))
        .await
        .json::<Value>()["data"]
        .clone();
    assert_eq!(listing["coverImageUrl"], placeholder);
}

#[tokio::test]
async fn test_creation_without_images_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/listings")
        .json(&listing_body("Viação Sul", &[]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("image"));

    let list = app.server.get("/api/listings").await.json::<Value>();
    assert_eq!(list["data"]["totalItems"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = spawn_app().await;
    let response = app
        .server
        .post("/api/listings")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pagination_math() {
    let app = spawn_app().await;

    let empty = app.server.get("/api/listings").await.json::<Value>();
    assert_eq!(empty["data"]["totalPages"], 1);
    assert_eq!(empty["data"]["currentPage"], 1);

    for i in 0..45 {
        create_listing(&app, &listing_body(&format!("Seller {i}"), &[PHOTO])).await;
    }

    let page = app
        .server
        .get("/api/listings")
        .add_query_param("page", 3)
        .add_query_param("limit", 20)
        .await
        .json::<Value>();
    assert_eq!(page["data"]["totalItems"], 45);
    assert_eq!(page["data"]["totalPages"], 3);
    assert_eq!(page["data"]["currentPage"], 3);
    assert_eq!(page["data"]["items"].as_array().unwrap().len(), 5);

    // Garbage pagination falls back to the defaults
    let page = app
        .server
        .get("/api/listings")
        .add_query_param("page", "zero")
        .add_query_param("limit", -3)
        .await
        .json::<Value>();
    assert_eq!(page["data"]["currentPage"], 1);
    assert_eq!(page["data"]["items"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_newest_listings_come_first() {
    let app = spawn_app().await;
    create_listing(&app, &listing_body("First", &[PHOTO])).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    create_listing(&app, &listing_body("Second", &[PHOTO])).await;

    let page = app.server.get("/api/listings").await.json::<Value>();
    assert_eq!(page["data"]["items"][0]["sellerName"], "Second");
    assert_eq!(page["data"]["items"][1]["sellerName"], "First");
}

#[tokio::test]
async fn test_list_is_cached_until_ttl_expires() {
    let app = spawn_app().await;
    create_listing(&app, &listing_body("Viação Sul", &[PHOTO])).await;

    let first = app.server.get("/api/listings").await;
    assert_eq!(first.header("x-cache"), "MISS");
    assert_eq!(first.json::<Value>()["data"]["fromCache"], false);

    let second = app.server.get("/api/listings").await;
    assert_eq!(second.header("x-cache"), "HIT");
    assert_eq!(second.json::<Value>()["data"]["fromCache"], true);

    // A different query is a different cache entry
    let filtered = app
        .server
        .get("/api/listings")
        .add_query_param("city", "Curitiba")
        .await;
    assert_eq!(filtered.header("x-cache"), "MISS");

    app.clock
        .advance(app.config.cache.response_ttl + Duration::from_secs(1));
    let expired = app.server.get("/api/listings").await;
    assert_eq!(expired.header("x-cache"), "MISS");
}

#[tokio::test]
async fn test_writes_invalidate_cached_lists() {
    let app = spawn_app().await;
    let id = create_listing(&app, &listing_body("Viação Sul", &[PHOTO])).await;

    app.server.get("/api/listings").await;
    assert_eq!(app.server.get("/api/listings").await.header("x-cache"), "HIT");

    create_listing(&app, &listing_body("Viação Norte", &[PHOTO])).await;
    let after_create = app.server.get("/api/listings").await;
    assert_eq!(after_create.header("x-cache"), "MISS");
    assert_eq!(after_create.json::<Value>()["data"]["totalItems"], 2);

    app.server
        .patch(&format!("/api/listings/{id}"))
        .json(&json!({ "price": 650000.0 }))
        .await
        .assert_status_ok();
    assert_eq!(app.server.get("/api/listings").await.header("x-cache"), "MISS");

    app.server
        .patch(&format!("/api/listings/{id}/status"))
        .json(&json!({ "status": "approved" }))
        .await
        .assert_status_ok();
    let approved = app
        .server
        .get("/api/listings")
        .add_query_param("status", "approved")
        .await;
    assert_eq!(approved.header("x-cache"), "MISS");
    assert_eq!(approved.json::<Value>()["data"]["totalItems"], 1);

    app.server
        .delete(&format!("/api/listings/{id}"))
        .await
        .assert_status_ok();
    let after_delete = app.server.get("/api/listings").await;
    assert_eq!(after_delete.header("x-cache"), "MISS");
    assert_eq!(after_delete.json::<Value>()["data"]["totalItems"], 1);

    app.server
        .get(&format!("/api/listings/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_view_filters_pending() {
    let app = spawn_app().await;
    let approved = create_listing(&app, &listing_body("Approved", &[PHOTO])).await;
    create_listing(&app, &listing_body("Pending", &[PHOTO])).await;
    app.server
        .patch(&format!("/api/listings/{approved}/status"))
        .json(&json!({ "status": "APPROVED" }))
        .await
        .assert_status_ok();

    let pending = app
        .server
        .get("/api/admin/listings")
        .add_query_param("status", "pending")
        .await
        .json::<Value>();
    let items = pending["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["sellerName"], "Pending");
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let app = spawn_app().await;
    let id = create_listing(&app, &listing_body("Viação Sul", &[PHOTO])).await;

    app.server
        .patch(&format!("/api/listings/{id}/status"))
        .json(&json!({ "status": "archived" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .patch(&format!("/api/listings/{id}"))
        .json(&json!({ "images": [], "coverImageUrl": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/api/listings")
        .add_query_param("status", "sold")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_ids_and_routes_are_not_found() {
    let app = spawn_app().await;

    app.server
        .get("/api/listings/not-a-uuid")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .delete(&format!("/api/listings/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get("/api/nothing-here").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Route not found");
}

#[tokio::test]
async fn test_multipart_creation_stores_uploaded_cover() {
    let app = spawn_app().await;
    let form = MultipartForm::new()
        .add_text("sellerName", "Viação Multipart")
        .add_text("category", "urban")
        .add_text("price", "125000,50")
        .add_text("location[city]", "Joinville")
        .add_text("location[state]", "SC")
        .add_part(
            "cover",
            Part::bytes(png_bytes(32, 16))
                .file_name("cover.png")
                .mime_type("image/png"),
        );

    let response = app.server.post("/api/listings").multipart(form).await;
    response.assert_status(StatusCode::CREATED);
    let listing = response.json::<Value>()["data"].clone();
    assert!(listing["coverImageUrl"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(listing["location"]["city"], "Joinville");
    assert_eq!(listing["price"], 125000.5);
}

#[tokio::test]
async fn test_multipart_rejects_non_image_files() {
    let app = spawn_app().await;
    let form = MultipartForm::new()
        .add_text("sellerName", "Viação Multipart")
        .add_part(
            "cover",
            Part::bytes(b"plain text, not a photo".to_vec())
                .file_name("cover.png")
                .mime_type("image/png"),
        );

    app.server
        .post("/api/listings")
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cover_image_is_resized_and_cached() {
    let app = spawn_app().await;
    let cover = encode_data_uri("image/png", &png_bytes(200, 100));
    let mut body = listing_body("Viação Sul", &[]);
    body["coverImageUrl"] = json!(cover);
    let id = create_listing(&app, &body).await;

    let first = app
        .server
        .get(&format!("/api/listings/{id}/cover"))
        .add_query_param("w", 50)
        .add_query_param("fmt", "png")
        .await;
    first.assert_status_ok();
    assert_eq!(first.header("content-type"), "image/png");
    assert_eq!(first.header("cache-control"), "public, max-age=86400");
    assert_eq!(first.header("x-cache"), "MISS");
    let img = image::load_from_memory(first.as_bytes()).unwrap();
    assert_eq!((img.width(), img.height()), (50, 25));

    let second = app
        .server
        .get(&format!("/api/listings/{id}/cover"))
        .add_query_param("w", 50)
        .add_query_param("fmt", "png")
        .await;
    assert_eq!(second.header("x-cache"), "HIT");

    app.server
        .get(&format!("/api/listings/{id}/images/0"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
