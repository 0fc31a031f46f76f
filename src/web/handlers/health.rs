use axum::http::StatusCode;

/// GET /
pub async fn banner() -> &'static str {
    concat!("webbuses API ", env!("CARGO_PKG_VERSION"))
}

/// GET /healthz
pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
