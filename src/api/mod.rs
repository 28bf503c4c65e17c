use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::core::{
    Evaluator, Residency, ResidencyBreakdown, TaxResult, WithdrawalRequest, validate_amount,
};
use crate::format::{format_inr, format_usd};

pub const CALCULATION_PATH: &str = "/api/withdrawal-calculation";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalPayload {
    is_early_withdrawal: bool,
    amount_usd: f64,
    plan_type: String,
}

/// One residency card: every figure pre-formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidencyCard {
    pub usa_tax: String,
    pub india_tax: String,
    pub penalty: String,
    pub total_deducted: String,
    pub total_receivable: String,
}

impl From<&ResidencyBreakdown> for ResidencyCard {
    fn from(row: &ResidencyBreakdown) -> Self {
        Self {
            usa_tax: format_usd(row.usa_tax_usd),
            india_tax: format_inr(row.india_tax_inr),
            penalty: format_usd(row.penalty_usd),
            total_deducted: format_usd(row.total_deducted_usd),
            total_receivable: format_usd(row.total_receivable_usd),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidencyResults {
    #[serde(rename = "NRI")]
    pub nri: ResidencyCard,
    #[serde(rename = "RNOR")]
    pub rnor: ResidencyCard,
    #[serde(rename = "ROR")]
    pub ror: ResidencyCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationMeta {
    pub exchange_rate_usd_to_inr: f64,
    pub is_roth: bool,
    pub tax_year: i32,
    pub plan_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResponse {
    pub results: ResidencyResults,
    pub meta: CalculationMeta,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Builds the wire response. `result` must cover all three residencies.
pub fn calculation_response(evaluator: &Evaluator, result: &TaxResult) -> CalculationResponse {
    let card = |residency: Residency| {
        result
            .for_residency(residency)
            .map(ResidencyCard::from)
            .unwrap_or_else(|| ResidencyCard::from(&empty_breakdown(residency)))
    };

    CalculationResponse {
        results: ResidencyResults {
            nri: card(Residency::Nri),
            rnor: card(Residency::Rnor),
            ror: card(Residency::Ror),
        },
        meta: CalculationMeta {
            exchange_rate_usd_to_inr: result.exchange_rate.to_f64().unwrap_or_default(),
            is_roth: result.plan.is_roth(),
            tax_year: evaluator.tax_year().year(),
            plan_type: result.plan.label(),
        },
    }
}

fn empty_breakdown(residency: Residency) -> ResidencyBreakdown {
    ResidencyBreakdown {
        residency,
        usa_tax_usd: Decimal::ZERO,
        india_tax_inr: Decimal::ZERO,
        penalty_usd: Decimal::ZERO,
        total_deducted_usd: Decimal::ZERO,
        total_receivable_usd: Decimal::ZERO,
    }
}

pub fn router(evaluator: Evaluator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(CALCULATION_PATH, post(calculation_handler))
        .route(HEALTH_PATH, get(health_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .with_state(Arc::new(evaluator))
}

pub async fn run_http_server(host: IpAddr, port: u16, evaluator: Evaluator) -> std::io::Result<()> {
    let addr = SocketAddr::new(host, port);
    let exchange_rate = evaluator.exchange_rate();
    let tax_year = evaluator.tax_year().year();
    let app = router(evaluator);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, %exchange_rate, tax_year, "withdrawal tax API listening");
    info!("POST http://{addr}{CALCULATION_PATH}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculation_handler(
    State(evaluator): State<Arc<Evaluator>>,
    payload: Result<Json<WithdrawalPayload>, JsonRejection>,
) -> Response {
    let request = match payload
        .map_err(|rejection| rejection.body_text())
        .and_then(|Json(payload)| request_from_payload(payload))
    {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected withdrawal calculation request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let result = evaluator.evaluate(&request);
    json_response(StatusCode::OK, calculation_response(&evaluator, &result))
}

fn request_from_payload(payload: WithdrawalPayload) -> Result<WithdrawalRequest, String> {
    if !payload.amount_usd.is_finite() {
        return Err("amountUsd must be a finite number".to_string());
    }
    let amount_usd = Decimal::try_from(payload.amount_usd)
        .map_err(|e| format!("amountUsd is out of range: {e}"))?;
    let amount_usd = validate_amount(amount_usd).map_err(|e| e.to_string())?;

    Ok(WithdrawalRequest {
        amount_usd,
        is_early: payload.is_early_withdrawal,
        plan_type: payload.plan_type,
        residency: None,
    })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
