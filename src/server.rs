//! Endpoint HTTP de génération.
//!
//! `POST /generate` exécute le moteur sur un thread bloquant et renvoie la
//! réponse JSON habituelle; `GET /health` sert de sonde.

use crate::model::ScheduleRequest;
use crate::scheduler::{GenerateResponse, SchedError, Scheduler, SolveBudget};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Copy)]
struct AppState {
    budget: SolveBudget,
}

pub fn router(budget: SolveBudget) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .with_state(AppState { budget })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, budget: SolveBudget) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(budget))
        .await
        .context("http server")?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /generate
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerateResponse>) {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "rejected request body");
            let response = GenerateResponse::Error {
                message: format!("invalid input: {}", rejection.body_text()),
            };
            return (StatusCode::BAD_REQUEST, Json(response));
        }
    };

    let budget = state.budget;
    let outcome = tokio::task::spawn_blocking(move || {
        let count = request.num_solutions();
        Scheduler::from_request(&request).and_then(|s| s.with_budget(budget).generate(count))
    })
    .await
    .unwrap_or_else(|err| Err(SchedError::Other(anyhow::anyhow!("solver task failed: {err}"))));

    let status = match &outcome {
        Err(SchedError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    if let Err(err) = &outcome {
        tracing::warn!(%err, "generation failed");
    }
    (status, Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn budget() -> SolveBudget {
        SolveBudget {
            total: Duration::from_secs(5),
            per_call: Duration::from_secs(2),
            single: Duration::from_secs(5),
        }
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let resp = router(budget()).oneshot(request).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Grille entièrement pré-remplie par une rotation Z HC IA R R.
    fn pinned_request(num_solutions: usize) -> Value {
        let cycle = ["Z", "HC", "IA", "R", "R"];
        let mut schedule = Vec::new();
        let mut quotas = serde_json::Map::new();
        for m in 0..5 {
            let days: Vec<&str> = (0..28).map(|d| cycle[(d + m) % 5]).collect();
            let off = days.iter().filter(|d| **d == "R").count();
            quotas.insert(format!("M{m}"), json!(off));
            schedule.push(json!({ "name": format!("M{m}"), "days": days }));
        }
        json!({
            "schedule": schedule,
            "option": {
                "dayOffIndividual": quotas,
                "targetMonth": "2026-02"
            },
            "numSolutions": num_solutions
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn pinned_grid_is_returned_as_is() {
        let (status, body) = call(post_json(pinned_request(2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 2);
        let first = &body["schedules"][0];
        assert_eq!(first[0]["name"], "M0");
        assert_eq!(first[0]["days"][0], "Z");
        assert_eq!(first[0]["days"][3], "R");
        assert!(body["elapsed_time"].is_number());
    }

    #[tokio::test]
    async fn invalid_input_is_a_bad_request() {
        let empty = json!({ "schedule": [], "option": { "targetMonth": "2026-02" } });
        let (status, body) = call(post_json(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("no members"));

        let zero = pinned_request(0);
        let (status, _) = call(post_json(zero)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_month = json!({ "schedule": [], "option": { "targetMonth": "2026-13" } });
        let (status, body) = call(post_json(bad_month)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn infeasible_quota_is_an_error_body() {
        let mut req = pinned_request(1);
        req["option"]["dayOffIndividual"]["M0"] = json!(27);
        let (status, body) = call(post_json(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("INFEASIBLE"));
    }
}
