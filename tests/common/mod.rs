#![allow(dead_code)]

use axum_test::TestServer;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;

use webbuses::cache::ManualClock;
use webbuses::config::Config;
use webbuses::database::Database;
use webbuses::web::{create_router, AppState};

pub struct TestApp {
    pub server: TestServer,
    pub clock: Arc<ManualClock>,
    pub config: Config,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Config::default()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let database = Database::in_memory().await.unwrap();
    let clock = Arc::new(ManualClock::new());
    let state = AppState::build(&config, &database, clock.clone()).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();
    TestApp {
        server,
        clock,
        config,
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 40]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn listing_body(seller: &str, images: &[&str]) -> Value {
    json!({
        "sellerName": seller,
        "category": "highway",
        "bodyManufacturer": "Marcopolo",
        "bodyModel": "Paradiso 1800 DD",
        "price": 720000.0,
        "location": { "city": "Curitiba", "state": "PR" },
        "images": images,
    })
}

/// Create a listing and return its id
pub async fn create_listing(app: &TestApp, body: &Value) -> String {
    let response = app.server.post("/api/listings").json(body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}
