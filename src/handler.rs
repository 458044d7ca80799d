use std::sync::Arc;

use axum::{
    Json, async_trait,
    body::Body,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::api::{ApiResponse, ErrorResponse, ListResponse, StatusResponse};
use crate::db::Database;
use crate::error::StoreError;
use crate::unpack_error;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub loan_period_days: u32,
}

impl AppState {
    pub fn new(db: Arc<Database>, loan_period_days: u32) -> Self {
        AppState { db, loan_period_days }
    }
}

/// The school's calendar date, used for loan defaults and overdue checks.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse { data })).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse { data })).into_response()
}

pub fn listed<T: Serialize>(data: Vec<T>) -> Response {
    (StatusCode::OK, Json(ListResponse::new(data))).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn not_found(msg: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(msg))).into_response()
}

pub fn bad_request(msg: &str) -> Response {
    info!(reason = msg, "rejected malformed request");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
}

/// Same limit axum applies to `Json` by default.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// A JSON body. Rejections answer 400 with an [`ErrorResponse`] instead of
/// axum's plain-text 415/422.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// An optional JSON body: an empty body yields `T::default()`. Anything else
/// must be well-formed JSON with a JSON content type.
pub struct JsonOrDefault<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrDefault<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| bad_request(&format!("Failed to read request body: {}", e)))?;
        if bytes.is_empty() {
            return Ok(JsonOrDefault(T::default()));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        Ok(JsonOrDefault(value))
    }
}

/// Path parameters; a value that does not parse answers 400 with an [`ErrorResponse`].
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParam(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// Query string filters; a value that does not parse answers 400 with an [`ErrorResponse`].
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// Maps a store error onto its HTTP answer. Storage failures are logged with
/// their whole source chain and hidden behind a generic message.
pub fn failure(action: &str, err: StoreError) -> Response {
    match err {
        StoreError::Validation(details) => {
            info!(action, "rejected invalid submission");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Validation failed", details)),
            )
                .into_response()
        }
        StoreError::NotFound(entity) => not_found(&format!("{} not found", entity)),
        StoreError::Conflict(msg) => {
            info!(action, reason = %msg, "request conflicts with stored data");
            (StatusCode::CONFLICT, Json(ErrorResponse::new(&msg))).into_response()
        }
        err @ (StoreError::Database(_) | StoreError::Internal(_)) => {
            tracing::error!(action, error = %unpack_error(&err), "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(&format!("Failed to {}", action))),
            )
                .into_response()
        }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusResponse { status: "ok" })
}

pub async fn sync(State(state): State<AppState>) -> Response {
    if !state.db.is_replica() {
        return (StatusCode::OK, Json(StatusResponse { status: "local" })).into_response();
    }

    match state.db.sync().await {
        Ok(()) => {
            info!("replica synced on request");
            (StatusCode::OK, Json(StatusResponse { status: "synced" })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to sync replica");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Failed to sync with remote database")),
            )
                .into_response()
        }
    }
}
