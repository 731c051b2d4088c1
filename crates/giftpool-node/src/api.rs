//! HTTP API server for the Giftpool node.
//!
//! REST endpoints for gifts, contributions, settlement decisions, balance
//! checks, and the cron-triggered alert run.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use giftpool_core::{Gift, GiftEvent, GiftId, GiftLifecycle, Money};
use giftpool_float::{evaluate, BalanceTier, FloatGateway, CRITICAL_THRESHOLD, LOW_THRESHOLD};
use giftpool_ledger::{Contribution, Contributor, LedgerError};
use giftpool_settlement::{SettlementError, SettlementMethod};

use crate::state::AppState;

// --- Response types ---

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    pub gift_count: usize,
    pub settlement_count: usize,
    pub float_cache_age_secs: Option<i64>,
}

#[derive(Serialize)]
pub struct GiftResponse {
    pub id: Uuid,
    pub organizer: String,
    pub title: String,
    pub target: f64,
    pub deadline: DateTime<Utc>,
    pub status: String,
    pub total: f64,
}

#[derive(Serialize)]
pub struct ContributionInfo {
    pub id: Uuid,
    pub amount: f64,
    pub contributor: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Contribution> for ContributionInfo {
    fn from(c: &Contribution) -> Self {
        Self {
            id: *c.id.as_uuid(),
            amount: c.amount.to_f64(),
            contributor: c.contributor.display_name().to_string(),
            message: c.message.clone(),
            status: c.status.to_string(),
            created_at: c.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct RecordContributionResponse {
    pub contribution: ContributionInfo,
    pub gift_total: f64,
    pub message: String,
}

#[derive(Serialize)]
pub struct ContributionsResponse {
    pub contributions: Vec<ContributionInfo>,
    pub count: usize,
    pub total: f64,
}

#[derive(Serialize)]
pub struct BalanceCheckResponse {
    pub balance: Option<f64>,
    pub currency_code: Option<String>,
    pub requested_amount: f64,
    pub can_fulfill_gift_card: bool,
}

#[derive(Serialize)]
pub struct OfferResponse {
    pub gift_id: Uuid,
    pub surplus: f64,
    pub methods: Vec<SettlementMethod>,
    pub balance: Option<f64>,
}

#[derive(Serialize)]
pub struct SettlementResponse {
    pub id: Uuid,
    pub gift_id: Uuid,
    pub method: SettlementMethod,
    pub payable: f64,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AlertThresholds {
    pub low: f64,
    pub critical: f64,
}

#[derive(Serialize)]
pub struct AlertRunResponse {
    pub balance: f64,
    pub tier: String,
    pub thresholds: AlertThresholds,
    pub alerted: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Request types ---

#[derive(Deserialize)]
pub struct CreateGiftRequest {
    pub organizer: String,
    pub title: String,
    pub target: f64,
    pub deadline: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RecordContributionRequest {
    pub amount: Option<f64>,
    pub contributor_name: Option<String>,
    pub contributor_email: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct BalanceCheckParams {
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct SettleRequest {
    pub method: SettlementMethod,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn err(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Generic 500 without internal detail; context goes to the log.
fn internal(context: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!(context = %context, error = %e, "internal error");
    err(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn map_settlement_error(e: SettlementError) -> ApiError {
    match e {
        SettlementError::AlreadySettled(_) | SettlementError::InsufficientFloat { .. } => {
            err(StatusCode::CONFLICT, e.to_string())
        }
        SettlementError::NothingToSettle(_) => err(StatusCode::BAD_REQUEST, e.to_string()),
        SettlementError::GiftCardUnavailable(_) => err(StatusCode::BAD_GATEWAY, e.to_string()),
        SettlementError::Ledger(e) => internal("settlement ledger read", e),
    }
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let gift_count = state
        .storage
        .gift_count()
        .map_err(|e| internal("gift count", e))?;
    let cache_age = state
        .float
        .cached()
        .await
        .map(|b| Utc::now().signed_duration_since(b.fetched_at).num_seconds());

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        gift_count,
        settlement_count: state.engine.settlement_count(),
        float_cache_age_secs: cache_age,
    }))
}

async fn handle_create_gift(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGiftRequest>,
) -> Result<(StatusCode, Json<GiftResponse>), ApiError> {
    let target = Money::from_f64(req.target)
        .map_err(|e| err(StatusCode::BAD_REQUEST, e.to_string()))?;

    let gift = Gift::new(req.organizer, req.title, target, req.deadline);
    state
        .storage
        .put_gift(&gift)
        .map_err(|e| internal("store gift", e))?;

    tracing::info!(gift_id = %gift.id, target = %gift.target, "gift created");
    Ok((
        StatusCode::CREATED,
        Json(gift_response(&gift, Money::ZERO)),
    ))
}

fn gift_response(gift: &Gift, total: Money) -> GiftResponse {
    GiftResponse {
        id: *gift.id.as_uuid(),
        organizer: gift.organizer.clone(),
        title: gift.title.clone(),
        target: gift.target.to_f64(),
        deadline: gift.deadline,
        status: gift.status.to_string(),
        total: total.to_f64(),
    }
}

async fn handle_get_gift(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GiftResponse>, ApiError> {
    let gift_id = GiftId::from_uuid(id);
    let gift = state
        .storage
        .get_gift(gift_id)
        .map_err(|e| internal("load gift", e))?
        .ok_or_else(|| err(StatusCode::NOT_FOUND, format!("gift not found: {id}")))?;

    let total = state
        .ledger
        .total_for(gift_id)
        .await
        .map_err(|e| internal("gift total", e))?;

    Ok(Json(gift_response(&gift, total)))
}

async fn handle_record_contribution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordContributionRequest>,
) -> Result<(StatusCode, Json<RecordContributionResponse>), ApiError> {
    let gift_id = GiftId::from_uuid(id);

    let amount = req
        .amount
        .ok_or_else(|| err(StatusCode::BAD_REQUEST, "missing required field: amount"))?;
    let amount = Money::from_f64(amount)
        .map_err(|e| err(StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .storage
        .get_gift(gift_id)
        .map_err(|e| internal("load gift", e))?
        .ok_or_else(|| err(StatusCode::NOT_FOUND, format!("gift not found: {id}")))?;

    let contributor = match req.contributor_name {
        Some(name) if !name.trim().is_empty() => Contributor::Named {
            name,
            email: req.contributor_email,
        },
        _ => Contributor::Anonymous,
    };

    let contribution = state
        .ledger
        .record(gift_id, amount, contributor, req.message)
        .await
        .map_err(|e| match e {
            LedgerError::InvalidAmount(_) => err(StatusCode::BAD_REQUEST, e.to_string()),
            other => internal("record contribution", other),
        })?;

    let gift_total = state
        .ledger
        .total_for(gift_id)
        .await
        .map_err(|e| internal("gift total", e))?;

    let message = format!(
        "{} added {}. The pool is now at {}.",
        contribution.contributor.display_name(),
        contribution.amount,
        gift_total
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordContributionResponse {
            contribution: ContributionInfo::from(&contribution),
            gift_total: gift_total.to_f64(),
            message,
        }),
    ))
}

async fn handle_list_contributions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContributionsResponse>, ApiError> {
    let gift_id = GiftId::from_uuid(id);

    let entries = state
        .ledger
        .list_for(gift_id)
        .await
        .map_err(|e| internal("list contributions", e))?;
    let total = state
        .ledger
        .total_for(gift_id)
        .await
        .map_err(|e| internal("gift total", e))?;

    let contributions: Vec<ContributionInfo> = entries.iter().map(ContributionInfo::from).collect();
    let count = contributions.len();
    Ok(Json(ContributionsResponse {
        contributions,
        count,
        total: total.to_f64(),
    }))
}

async fn handle_balance_check(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<BalanceCheckParams>,
) -> Result<Json<BalanceCheckResponse>, (StatusCode, Json<BalanceCheckResponse>)> {
    let requested = match Money::from_f64(params.amount) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(gift_id = %id, error = %e, "bad balance check amount");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(BalanceCheckResponse {
                    balance: None,
                    currency_code: None,
                    requested_amount: params.amount,
                    can_fulfill_gift_card: false,
                }),
            ));
        }
    };

    match state.float.fetch_balance().await {
        Ok(balance) => Ok(Json(BalanceCheckResponse {
            balance: Some(balance.amount.to_f64()),
            currency_code: Some(balance.currency.code().to_string()),
            requested_amount: requested.to_f64(),
            can_fulfill_gift_card: balance.amount >= requested,
        })),
        Err(e) => {
            tracing::warn!(gift_id = %id, amount = %requested, error = %e, "balance check failed upstream");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(BalanceCheckResponse {
                    balance: None,
                    currency_code: None,
                    requested_amount: requested.to_f64(),
                    can_fulfill_gift_card: false,
                }),
            ))
        }
    }
}

async fn handle_get_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, ApiError> {
    let offer = state
        .engine
        .offer(GiftId::from_uuid(id))
        .await
        .map_err(map_settlement_error)?;

    Ok(Json(OfferResponse {
        gift_id: *offer.gift_id.as_uuid(),
        surplus: offer.surplus.to_f64(),
        methods: offer.methods,
        balance: offer.balance.map(|b| b.to_f64()),
    }))
}

async fn handle_settle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettleRequest>,
) -> Result<(StatusCode, Json<SettlementResponse>), ApiError> {
    let gift_id = GiftId::from_uuid(id);

    let settlement = state
        .engine
        .settle(gift_id, req.method)
        .await
        .map_err(map_settlement_error)?;

    state
        .storage
        .put_settlement(&settlement)
        .map_err(|e| internal("store settlement", e))?;

    // Advance the gift record; the settlement itself is already durable.
    match state.storage.get_gift(gift_id) {
        Ok(Some(mut gift)) => {
            match GiftLifecycle::transition(gift.status, GiftEvent::SettlementRecorded) {
                Ok(status) => {
                    gift.status = status;
                    if let Err(e) = state.storage.put_gift(&gift) {
                        tracing::error!(gift_id = %gift_id, error = %e, "failed to update gift status");
                    }
                }
                Err(e) => {
                    tracing::warn!(gift_id = %gift_id, error = %e, "gift status not advanced");
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(gift_id = %gift_id, error = %e, "failed to load gift after settlement");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(SettlementResponse {
            id: *settlement.id.as_uuid(),
            gift_id: *settlement.gift_id.as_uuid(),
            method: settlement.method,
            payable: settlement.payable.to_f64(),
            currency_code: settlement.currency.code().to_string(),
            created_at: settlement.created_at,
        }),
    ))
}

/// Entry point for the settlement UI: routes to the gift-card flow only
/// when a fresh balance clears the configured minimum; any failure falls
/// back to the credits flow.
async fn handle_settle_redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Redirect {
    let settlement = &state.config.settlement;

    let target = match state.float.fetch_balance().await {
        Ok(balance) if balance.amount >= state.min_gift_card_float => {
            format!("{}/{}", settlement.gift_card_path, id)
        }
        Ok(balance) => {
            tracing::info!(
                gift_id = %id,
                balance = %balance.amount,
                "float below gift card minimum, routing to credits"
            );
            format!("{}/{}", settlement.credits_path, id)
        }
        Err(e) => {
            tracing::warn!(gift_id = %id, error = %e, "balance unavailable, routing to credits");
            format!("{}/{}", settlement.credits_path, id)
        }
    };

    Redirect::temporary(&target)
}

async fn handle_run_alerts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AlertRunResponse>, ApiError> {
    let expected = state
        .config
        .alerts
        .cron_secret
        .as_deref()
        .ok_or_else(|| err(StatusCode::UNAUTHORIZED, "cron trigger not configured"))?;

    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided != Some(expected) {
        return Err(err(StatusCode::UNAUTHORIZED, "invalid cron token"));
    }

    // Alerting always works off a fresh read, not the cache.
    let balance = state.float.refresh().await.map_err(|e| {
        tracing::warn!(error = %e, "alert run could not fetch balance");
        err(StatusCode::BAD_GATEWAY, "balance upstream unavailable")
    })?;

    let alert = {
        let mut alert_state = state.alert_state.lock().unwrap();
        evaluate(&balance, &mut alert_state)
    };

    let alerted = alert.is_some();
    if let Some(alert) = alert {
        // Delivery failures are logged and tolerated; the next tier entry
        // will alert again.
        if let Err(e) = state.notifier.notify(&alert).await {
            tracing::error!(tier = %alert.tier, error = %e, "alert webhook delivery failed");
        }
    }

    Ok(Json(AlertRunResponse {
        balance: balance.amount.to_f64(),
        tier: BalanceTier::classify(balance.amount).to_string(),
        thresholds: AlertThresholds {
            low: LOW_THRESHOLD.to_f64(),
            critical: CRITICAL_THRESHOLD.to_f64(),
        },
        alerted,
    }))
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/gifts", post(handle_create_gift))
        .route("/api/v1/gifts/{id}", get(handle_get_gift))
        .route(
            "/api/v1/gifts/{id}/contributions",
            get(handle_list_contributions).post(handle_record_contribution),
        )
        .route("/api/v1/gifts/{id}/balance-check", get(handle_balance_check))
        .route(
            "/api/v1/gifts/{id}/settlement",
            get(handle_get_offer).post(handle_settle),
        )
        .route("/settle/{id}", get(handle_settle_redirect))
        .route("/api/v1/alerts/run", post(handle_run_alerts))
        .with_state(state)
}

pub async fn start_api_server(listen_addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("received shutdown signal");
        })
        .await?;
    Ok(())
}
