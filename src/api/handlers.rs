//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{BulkFilter, PageRequest, StatsFilter};

use super::request::{
    BulkGenerateRequest, GenerateRequest, ListRecordsQuery, MarkPaidRequest, StatsQuery,
    UpdateTaxRulesRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll/generate", post(generate_handler))
        .route("/payroll/bulk", post(bulk_generate_handler))
        .route("/payroll/bulk/:id/cancel", post(cancel_bulk_handler))
        .route("/payroll/records", get(list_records_handler))
        .route("/payroll/records/:id", get(get_record_handler))
        .route("/payroll/records/:id/process", post(process_handler))
        .route("/payroll/records/:id/pay", post(mark_paid_handler))
        .route("/payroll/stats", get(stats_handler))
        .route("/payroll/countries", get(countries_handler))
        .route(
            "/payroll/tax-rules/:country",
            get(get_tax_rules_handler).put(update_tax_rules_handler),
        )
        .with_state(state)
}

/// Handler for POST /payroll/generate.
async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing generate request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };
    if let Err(error) = request.validate() {
        return json_response(StatusCode::BAD_REQUEST, error);
    }

    let start_time = Instant::now();
    match state
        .engine()
        .lifecycle()
        .generate(&request.employee_id, request.period(), &request.country)
        .await
    {
        Ok(record) => {
            info!(
                correlation_id = %correlation_id,
                record_id = %record.id,
                employee_id = %record.employee_id,
                net_pay = %record.net_pay,
                duration_us = start_time.elapsed().as_micros(),
                "Payroll generated"
            );
            json_response(StatusCode::CREATED, record)
        }
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /payroll/bulk.
///
/// Runs the whole job before responding. A caller that supplies `job_id`
/// can cancel the job from another request while it runs.
async fn bulk_generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkGenerateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing bulk generate request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };
    if let Err(error) = request.validate() {
        return json_response(StatusCode::BAD_REQUEST, error);
    }

    let job_id = request.job_id;
    let filter: BulkFilter = request.into();
    match state.engine().bulk().run(filter, job_id).await {
        Ok(job) => {
            info!(
                correlation_id = %correlation_id,
                job_id = %job.id,
                total = job.summary.total,
                succeeded = job.summary.succeeded,
                failed = job.summary.failed,
                cancelled = job.summary.cancelled,
                "Bulk generation finished"
            );
            json_response(StatusCode::OK, job)
        }
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /payroll/bulk/:id/cancel.
async fn cancel_bulk_handler(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let Ok(job_id) = Uuid::parse_str(&raw_id) else {
        return json_response(StatusCode::BAD_REQUEST, ApiError::invalid_id(&raw_id));
    };

    if state.engine().bulk().cancel(job_id).await {
        info!(correlation_id = %correlation_id, job_id = %job_id, "Bulk cancellation requested");
        json_response(
            StatusCode::ACCEPTED,
            json!({ "job_id": job_id, "status": "cancellation_requested" }),
        )
    } else {
        warn!(correlation_id = %correlation_id, job_id = %job_id, "Bulk job not running");
        json_response(StatusCode::NOT_FOUND, ApiError::job_not_found(job_id))
    }
}

/// Handler for POST /payroll/records/:id/process.
async fn process_handler(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let Ok(record_id) = Uuid::parse_str(&raw_id) else {
        return json_response(StatusCode::BAD_REQUEST, ApiError::invalid_id(&raw_id));
    };

    match state.engine().lifecycle().process(record_id).await {
        Ok(record) => {
            info!(
                correlation_id = %correlation_id,
                record_id = %record.id,
                status = %record.status,
                "Payroll record processed"
            );
            json_response(StatusCode::OK, record)
        }
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for POST /payroll/records/:id/pay.
///
/// Every payment field is optional, so an empty body is accepted with or
/// without a content type.
async fn mark_paid_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let Ok(record_id) = Uuid::parse_str(&raw_id) else {
        return json_response(StatusCode::BAD_REQUEST, ApiError::invalid_id(&raw_id));
    };
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        MarkPaidRequest::default()
    } else {
        match Json::<MarkPaidRequest>::from_bytes(&body) {
            Ok(Json(req)) => req,
            Err(rejection) => return json_rejection(correlation_id, rejection),
        }
    };

    match state
        .engine()
        .lifecycle()
        .mark_paid(record_id, request.into())
        .await
    {
        Ok(record) => {
            info!(correlation_id = %correlation_id, record_id = %record.id, "Payroll record paid");
            json_response(StatusCode::OK, record)
        }
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /payroll/records.
async fn list_records_handler(
    State(state): State<AppState>,
    query: Result<Query<ListRecordsQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection(correlation_id, rejection),
    };

    let lifecycle = state.engine().lifecycle();
    let page = PageRequest {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(lifecycle.listing().default_page_size),
    };
    match lifecycle.list(&query.filter(), page).await {
        Ok(page) => json_response(StatusCode::OK, page),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /payroll/records/:id.
async fn get_record_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let Ok(record_id) = Uuid::parse_str(&raw_id) else {
        return json_response(StatusCode::BAD_REQUEST, ApiError::invalid_id(&raw_id));
    };

    match state.engine().lifecycle().get_by_id(record_id).await {
        Ok(record) => json_response(StatusCode::OK, record),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /payroll/stats.
async fn stats_handler(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let filter: StatsFilter = match query {
        Ok(Query(query)) => query.into(),
        Err(rejection) => return query_rejection(correlation_id, rejection),
    };

    match state.engine().stats().stats(&filter).await {
        Ok(stats) => json_response(StatusCode::OK, stats),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for GET /payroll/countries.
async fn countries_handler(State(state): State<AppState>) -> Response {
    let countries = state.engine().registry().list_supported_countries().await;
    json_response(StatusCode::OK, json!({ "countries": countries }))
}

/// Handler for GET /payroll/tax-rules/:country.
async fn get_tax_rules_handler(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().registry().get(&country).await {
        Ok(rule) => json_response(StatusCode::OK, &*rule),
        Err(err) => engine_error(correlation_id, err),
    }
}

/// Handler for PUT /payroll/tax-rules/:country.
///
/// Replaces the active rule set. The previous set stays active when the
/// new one fails validation.
async fn update_tax_rules_handler(
    State(state): State<AppState>,
    Path(country): Path<String>,
    payload: Result<Json<UpdateTaxRulesRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, country = %country, "Processing tax rule update");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let (rule_set, expected_version) = request.into_parts();
    match state
        .engine()
        .registry()
        .update(&country, rule_set, expected_version)
        .await
    {
        Ok(rule) => json_response(StatusCode::OK, &*rule),
        Err(err) => engine_error(correlation_id, err),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn engine_error(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

fn query_rejection(correlation_id: Uuid, rejection: QueryRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(
        correlation_id = %correlation_id,
        error = %body_text,
        "Query string error"
    );
    json_response(
        StatusCode::BAD_REQUEST,
        ApiError::new("INVALID_QUERY", body_text),
    )
}
