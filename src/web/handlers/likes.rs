use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    Json,
};

use crate::models::LikeRequest;
use crate::web::extractors::{json_rejection, ClientIp};
use crate::web::responses::{created, handle_error, ok};
use crate::web::AppState;

/// POST /api/likes
///
/// The IP in the body wins over the one derived from the connection.
pub async fn submit_like(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let listing_id = request.listing_id.unwrap_or_default();
    let ip = request
        .ip
        .filter(|ip| !ip.trim().is_empty())
        .or(client_ip)
        .unwrap_or_default();
    match state.likes.submit(&listing_id, &ip).await {
        Ok(receipt) => created(receipt),
        Err(e) => handle_error(e),
    }
}

/// GET /api/likes/{listing_id}
pub async fn count_likes(State(state): State<AppState>, Path(listing_id): Path<String>) -> Response {
    match state.likes.count(&listing_id).await {
        Ok(count) => ok(count),
        Err(e) => handle_error(e),
    }
}
