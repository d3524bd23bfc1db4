//! Presentation-only demo surface: fabricate fake inbound traffic, replay
//! it through the real pipeline, and report simulator statistics.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use careline_core::errors::ApplicationError;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::{
    interface_error_response, new_correlation_id, pipeline_error_response, ApiError,
};
use crate::bootstrap::AppState;
use crate::chat::ChatResponse;
use crate::simulator::{DemoActivity, DemoStatistics, SimulatedMessage};

#[derive(Debug, Deserialize)]
pub struct SimulateQuery {
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data: SimulatedMessage,
    pub instructions: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ProcessSimulatedRequest {
    pub user_id: String,
    pub message: String,
    pub platform: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessSimulatedResponse {
    pub status: &'static str,
    pub ai_result: ChatResponse,
    pub simulated_response: SimulatedMessage,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub status: &'static str,
    pub simulation_mode: bool,
    pub statistics: DemoStatistics,
    pub recent_activity: Vec<DemoActivity>,
}

#[derive(Debug, Serialize)]
pub struct LiveDemoResponse {
    pub incoming: SimulatedMessage,
    pub ai_result: ChatResponse,
    pub outgoing: SimulatedMessage,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/demo/simulate/message", get(simulate_message))
        .route("/demo/process/simulated", post(process_simulated))
        .route("/demo/dashboard", get(dashboard))
        .route("/demo/live", post(live_demo))
}

/// Fabricate a customer message from the demo roster.
pub async fn simulate_message(
    State(state): State<AppState>,
    Query(query): Query<SimulateQuery>,
) -> Result<Json<SimulateResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();

    match state.simulator.simulate_incoming(query.platform.as_deref()) {
        Some(data) => {
            info!(
                event_name = "demo.simulated_message",
                correlation_id = %correlation_id,
                platform = %data.platform,
                user_id = %data.user_id,
                "simulated inbound customer message"
            );
            Ok(Json(SimulateResponse {
                status: "simulated",
                message: "Customer message simulated successfully",
                data,
                instructions: "POST the payload to /demo/process/simulated to see the reply",
            }))
        }
        None => Err(interface_error_response(
            ApplicationError::Validation(format!(
                "no demo users on platform `{}`",
                query.platform.as_deref().unwrap_or("")
            ))
            .into_interface(correlation_id),
        )),
    }
}

/// Replay a simulated message through the real pipeline.
pub async fn process_simulated(
    State(state): State<AppState>,
    Json(request): Json<ProcessSimulatedRequest>,
) -> Result<Json<ProcessSimulatedResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();

    let processed = state
        .pipeline
        .process_message(&request.message, &request.user_id, &request.platform)
        .await
        .map_err(|pipeline_error| {
            error!(
                event_name = "demo.process.failed",
                correlation_id = %correlation_id,
                error = %pipeline_error,
                "simulated message processing failed"
            );
            pipeline_error_response(pipeline_error, &correlation_id)
        })?;

    let simulated_response = state.simulator.record_reply(&request.user_id, &processed.response_text);

    Ok(Json(ProcessSimulatedResponse {
        status: "processed",
        ai_result: ChatResponse::from_processed(processed),
        simulated_response,
    }))
}

/// Aggregate simulator statistics plus the latest roster activity.
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        status: "live",
        simulation_mode: true,
        statistics: state.simulator.statistics(),
        recent_activity: state.simulator.recent_activity(3),
    })
}

/// One-shot demo: fabricate a message, answer it, record the exchange.
pub async fn live_demo(
    State(state): State<AppState>,
) -> Result<Json<LiveDemoResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();

    let incoming = state.simulator.simulate_incoming(None).ok_or_else(|| {
        interface_error_response(
            ApplicationError::Configuration("demo roster is empty".to_string())
                .into_interface(correlation_id.clone()),
        )
    })?;

    let processed = state
        .pipeline
        .process_message(&incoming.message, &incoming.user_id, &incoming.platform)
        .await
        .map_err(|pipeline_error| {
            error!(
                event_name = "demo.live.failed",
                correlation_id = %correlation_id,
                error = %pipeline_error,
                "live demo processing failed"
            );
            pipeline_error_response(pipeline_error, &correlation_id)
        })?;

    let outgoing = state.simulator.record_reply(&incoming.user_id, &processed.response_text);

    Ok(Json(LiveDemoResponse {
        incoming,
        ai_result: ChatResponse::from_processed(processed),
        outgoing,
    }))
}
