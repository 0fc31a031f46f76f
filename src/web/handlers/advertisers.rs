use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};

use crate::models::AdvertiserCreateRequest;
use crate::web::extractors::json_rejection;
use crate::web::responses::{created, handle_error};
use crate::web::AppState;

/// POST /api/advertisers
pub async fn create_advertiser(
    State(state): State<AppState>,
    body: Result<Json<AdvertiserCreateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    match state.advertisers.register(request).await {
        Ok(advertiser) => created(advertiser),
        Err(e) => handle_error(e),
    }
}
