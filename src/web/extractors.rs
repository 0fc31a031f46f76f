//! Request extractors
//!
//! Query strings are parsed leniently: unparsable pagination or image parameters fall
//! back to their defaults instead of failing the request. Filters that cannot match
//! anything (an unknown status, a malformed advertiser id) are rejected with 400.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequestParts, Query},
    http::{request::Parts, HeaderMap},
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use uuid::Uuid;

use super::responses::handle_error;
use crate::errors::AppError;
use crate::models::{ListingFilter, ListingStatus};

type RawQuery = HashMap<String, String>;

async fn raw_query<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<RawQuery, Response> {
    Query::<RawQuery>::from_request_parts(parts, state)
        .await
        .map(|Query(q)| q)
        .map_err(|e| handle_error(AppError::validation(format!("Invalid query string: {e}"))))
}

fn text(query: &RawQuery, key: &str) -> Option<String> {
    query
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn number<T: std::str::FromStr>(query: &RawQuery, key: &str) -> Option<T> {
    text(query, key).and_then(|v| v.parse().ok())
}

/// Pagination and filters of a listing query
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub filter: ListingFilter,
}

impl ListParams {
    fn from_query(query: &RawQuery) -> Result<Self, AppError> {
        let status = text(query, "status")
            .map(|raw| ListingStatus::parse(&raw))
            .transpose()?;
        let advertiser_id = text(query, "advertiserId")
            .map(|raw| {
                Uuid::parse_str(&raw)
                    .map_err(|_| AppError::validation(format!("Invalid advertiserId '{raw}'")))
            })
            .transpose()?;

        Ok(Self {
            page: number(query, "page"),
            limit: number(query, "limit"),
            filter: ListingFilter {
                status,
                category: text(query, "category"),
                city: text(query, "city"),
                state: text(query, "state"),
                advertiser_id,
            },
        })
    }
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = raw_query(parts, state).await?;
        Self::from_query(&query).map_err(handle_error)
    }
}

/// Resize parameters of an image request: `w`, `q` and `fmt`
#[derive(Debug, Clone, Default)]
pub struct ImageParams {
    pub width: Option<u32>,
    pub quality: Option<u8>,
    pub format: Option<String>,
}

impl<S> FromRequestParts<S> for ImageParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = raw_query(parts, state).await?;
        Ok(Self {
            width: number(&query, "w"),
            quality: number::<u16>(&query, "q").map(|q| q.min(100) as u8),
            format: text(&query, "fmt"),
        })
    }
}

/// Best guess at the caller's address behind proxies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    fn from_headers(headers: &HeaderMap) -> Option<String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        header("x-forwarded-for")
            .and_then(|forwarded| {
                forwarded
                    .split(',')
                    .map(str::trim)
                    .find(|hop| !hop.is_empty())
                    .map(str::to_string)
            })
            .or_else(|| header("x-real-ip").map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty())
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = Self::from_headers(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        Ok(Self(ip))
    }
}

/// Malformed JSON bodies are client errors
pub fn json_rejection(rejection: JsonRejection) -> Response {
    handle_error(AppError::validation(rejection.body_text()))
}
