//! HTTP API module for the payroll engine.
//!
//! This module exposes payroll generation, lifecycle transitions, bulk
//! jobs, statistics and tax rule administration as REST endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BulkGenerateRequest, GenerateRequest, ListRecordsQuery, MarkPaidRequest, StatsQuery,
    UpdateTaxRulesRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
