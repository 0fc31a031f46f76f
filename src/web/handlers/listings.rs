//! Listing endpoints

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::cdn::ImageUpload;
use crate::errors::{AppError, AppResult};
use crate::images::RenderedImage;
use crate::models::{ListingCreateRequest, ListingUpdateRequest, StatusUpdateRequest};
use crate::services::{ImageSlot, ListingUploads};
use crate::web::extractors::{json_rejection, ImageParams, ListParams};
use crate::web::responses::{created, handle_error, ok, ApiResponse};
use crate::web::AppState;

const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

fn cache_header(hit: bool) -> HeaderValue {
    HeaderValue::from_static(if hit { "HIT" } else { "MISS" })
}

/// Path ids that are not UUIDs cannot name an existing listing
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Listing", raw))
}

/// GET /api/listings and GET /api/admin/listings
pub async fn list_listings(State(state): State<AppState>, params: ListParams) -> Response {
    let page = state.listings.page_request(params.page, params.limit);
    match state.listings.list(&params.filter, page).await {
        Ok(result) => {
            let hit = result.from_cache;
            let mut response = (StatusCode::OK, Json(ApiResponse::success(result))).into_response();
            response.headers_mut().insert("x-cache", cache_header(hit));
            response
        }
        Err(e) => handle_error(e),
    }
}

/// GET /api/listings/{id}
pub async fn get_listing(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match parse_id(&id) {
        Ok(id) => state.listings.get(id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(listing) => ok(listing),
        Err(e) => handle_error(e),
    }
}

/// POST /api/listings, either a JSON body or a multipart form with files
pub async fn create_listing(State(state): State<AppState>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let (draft, uploads) = if is_multipart {
        let multipart = match Multipart::from_request(request, &state).await {
            Ok(multipart) => multipart,
            Err(rejection) => {
                return handle_error(AppError::validation(rejection.body_text()));
            }
        };
        match read_listing_form(multipart, state.upload_limit, state.request_limit).await {
            Ok(parsed) => parsed,
            Err(e) => return handle_error(e),
        }
    } else {
        match Json::<ListingCreateRequest>::from_request(request, &state).await {
            Ok(Json(draft)) => (draft, ListingUploads::default()),
            Err(rejection) => return json_rejection(rejection),
        }
    };

    match state.listings.create(draft, uploads).await {
        Ok(listing) => created(listing),
        Err(e) => handle_error(e),
    }
}

/// Split a multipart form into text fields and image files
async fn read_listing_form(
    mut multipart: Multipart,
    upload_limit: usize,
    request_limit: usize,
) -> Result<(ListingCreateRequest, ListingUploads), AppError> {
    let mut draft = ListingCreateRequest::default();
    let mut uploads = ListingUploads::default();
    let malformed = |e| multipart_error(e, request_limit);

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await.map_err(malformed)?;
            if bytes.is_empty() {
                continue;
            }
            let upload = ImageUpload::validated(filename, bytes, upload_limit)?;
            match name.as_str() {
                "cover" | "coverImage" => uploads.cover = Some(upload),
                "images" | "images[]" => uploads.gallery.push(upload),
                other => debug!(field = other, "ignoring unexpected file field"),
            }
        } else {
            let value = field.text().await.map_err(malformed)?;
            draft.set_text_field(&name, value)?;
        }
    }

    Ok((draft, uploads))
}

fn multipart_error(error: MultipartError, max_size: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            size: max_size.saturating_add(1),
            max_size,
        }
    } else {
        AppError::validation(format!("Malformed multipart body: {}", error.body_text()))
    }
}

/// PATCH /api/listings/{id}
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ListingUpdateRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Json(changes) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = match parse_id(&id) {
        Ok(id) => state.listings.update(id, changes).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(listing) => ok(listing),
        Err(e) => handle_error(e),
    }
}

/// PATCH /api/listings/{id}/status
pub async fn update_listing_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdateRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = match parse_id(&id) {
        Ok(id) => state.listings.update_status(id, &request.status).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(listing) => ok(listing),
        Err(e) => handle_error(e),
    }
}

/// DELETE /api/listings/{id}
pub async fn delete_listing(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match parse_id(&id) {
        Ok(id) => state.listings.delete(id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => ok(serde_json::json!({ "deleted": id })),
        Err(e) => handle_error(e),
    }
}

/// GET /api/listings/{id}/cover
pub async fn listing_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: ImageParams,
) -> Response {
    render_image(&state, &id, ImageSlot::Cover, params).await
}

/// GET /api/listings/{id}/images/{index}
pub async fn listing_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
    params: ImageParams,
) -> Response {
    match index.parse::<usize>() {
        Ok(index) => render_image(&state, &id, ImageSlot::Gallery(index), params).await,
        Err(_) => handle_error(AppError::not_found("Listing image", format!("{id}/{index}"))),
    }
}

async fn load_image(
    state: &AppState,
    id: &str,
    slot: ImageSlot,
    params: &ImageParams,
) -> AppResult<RenderedImage> {
    let id = parse_id(id)?;
    let variant = state.image_variant(params)?;
    state.listings.image(id, slot, &variant).await
}

async fn render_image(state: &AppState, id: &str, slot: ImageSlot, params: ImageParams) -> Response {
    let rendered = match load_image(state, id, slot, &params).await {
        Ok(rendered) => rendered,
        Err(e) => return handle_error(e),
    };

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&rendered.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(IMAGE_CACHE_CONTROL),
    );
    headers.insert("x-cache", cache_header(rendered.from_cache));
    (StatusCode::OK, headers, rendered.bytes).into_response()
}
