use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use irrigation_engine::catalog::{CatalogEntry, PLANT_TYPES, SOIL_TYPES};
use irrigation_engine::{Session, SessionView, ZoneId};

use crate::error::ApiError;

type AppState = Arc<Session>;
type ApiResult = Result<Json<SessionView>, ApiError>;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Catalog {
    plants: &'static [CatalogEntry],
    soils: &'static [CatalogEntry],
}

#[derive(Debug, Default, Deserialize)]
struct ZoneSelectionBody {
    plant_type: Option<String>,
    soil_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SoilBody {
    global_soil: Option<String>,
    use_global_soil: Option<bool>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(session: AppState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/catalog", get(api_catalog))
        .route("/api/welcome/new", post(welcome_new))
        .route("/api/welcome/existing", post(welcome_existing))
        .route("/api/setup/back", post(setup_back))
        .route("/api/setup/zones/{id}", put(setup_zone))
        .route("/api/setup/soil", put(setup_soil))
        .route("/api/setup/submit", post(setup_submit))
        .route("/api/reconfigure", post(reconfigure))
        .route("/api/zones/{id}/valve", post(toggle_valve))
        .route("/api/pump", post(toggle_pump))
        .with_state(session)
}

async fn api_status(State(session): State<AppState>) -> Json<SessionView> {
    Json(session.view().await)
}

async fn api_catalog() -> Json<Catalog> {
    Json(Catalog {
        plants: PLANT_TYPES,
        soils: SOIL_TYPES,
    })
}

async fn welcome_new(State(session): State<AppState>) -> ApiResult {
    session.just_planted().await?;
    Ok(Json(session.view().await))
}

async fn welcome_existing(State(session): State<AppState>) -> ApiResult {
    session.already_established().await?;
    Ok(Json(session.view().await))
}

async fn setup_back(State(session): State<AppState>) -> ApiResult {
    session.back().await?;
    Ok(Json(session.view().await))
}

async fn setup_zone(
    State(session): State<AppState>,
    Path(id): Path<ZoneId>,
    Json(body): Json<ZoneSelectionBody>,
) -> ApiResult {
    if let Some(plant) = &body.plant_type {
        session.select_plant(id, plant).await?;
    }
    if let Some(soil) = &body.soil_type {
        session.select_soil(id, soil).await?;
    }
    Ok(Json(session.view().await))
}

async fn setup_soil(State(session): State<AppState>, Json(body): Json<SoilBody>) -> ApiResult {
    if let Some(on) = body.use_global_soil {
        session.set_use_global_soil(on).await?;
    }
    if let Some(soil) = &body.global_soil {
        session.set_global_soil(soil).await?;
    }
    Ok(Json(session.view().await))
}

async fn setup_submit(State(session): State<AppState>) -> ApiResult {
    session.submit_configuration().await?;
    Ok(Json(session.view().await))
}

async fn reconfigure(State(session): State<AppState>) -> ApiResult {
    session.reconfigure().await?;
    Ok(Json(session.view().await))
}

async fn toggle_valve(State(session): State<AppState>, Path(id): Path<ZoneId>) -> ApiResult {
    session.toggle_valve(id).await?;
    Ok(Json(session.view().await))
}

async fn toggle_pump(State(session): State<AppState>) -> ApiResult {
    session.toggle_pump().await?;
    Ok(Json(session.view().await))
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(session: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web port {port}"))?;

    info!(%addr, "control surface listening");

    axum::serve(listener, router(session))
        .await
        .context("web server error")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use irrigation_engine::{IrrigationState, LocalExecutor};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn session() -> AppState {
        Arc::new(
            Session::new(IrrigationState::default(), Box::new(LocalExecutor::new())).with_seed(1),
        )
    }

    async fn call(
        session: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = router(session.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post(session: &AppState, uri: &str) -> (StatusCode, Value) {
        call(session, Method::POST, uri, None).await
    }

    async fn put(session: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        call(session, Method::PUT, uri, Some(body)).await
    }

    // -- Read-only routes -----------------------------------------------------

    #[tokio::test]
    async fn status_starts_on_welcome() {
        let s = session();
        let (status, body) = call(&s, Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screen"], "welcome");
        assert_eq!(body["zones"].as_array().unwrap().len(), 4);
        assert_eq!(body["open_zones"], 1);
        assert_eq!(body["telemetry_running"], false);
        assert_eq!(body["zones"][2]["status"], "Modéré");
    }

    #[tokio::test]
    async fn catalog_lists_plants_and_soils() {
        let s = session();
        let (status, body) = call(&s, Method::GET, "/api/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plants"].as_array().unwrap().len(), 8);
        assert_eq!(body["soils"].as_array().unwrap().len(), 5);
        assert_eq!(body["soils"][0]["label"], "Sol argileux");
    }

    // -- Onboarding -------------------------------------------------------------

    #[tokio::test]
    async fn full_setup_over_http() {
        let s = session();
        let (status, body) = post(&s, "/api/welcome/new").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screen"], "configuration");
        assert_eq!(body["planting"], "new");
        assert_eq!(body["can_submit"], false);

        for id in 1..=4 {
            let (status, _) = put(
                &s,
                &format!("/api/setup/zones/{id}"),
                json!({ "plant_type": "radis" }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, body) = put(&s, "/api/setup/soil", json!({ "global_soil": "calcaire" })).await;
        assert_eq!(body["can_submit"], true);

        let (status, body) = post(&s, "/api/setup/submit").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screen"], "dashboard");
        assert_eq!(body["telemetry_running"], true);
        assert_eq!(body["zones"][0]["plant_type"], "Radis");
        assert_eq!(body["zones"][3]["soil_type"], "Sol calcaire");

        s.shutdown().await;
    }

    #[tokio::test]
    async fn incomplete_submit_is_bad_request() {
        let s = session();
        post(&s, "/api/welcome/new").await;
        let (status, body) = post(&s, "/api/setup/submit").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().contains("incomplete"));
        assert_eq!(s.screen().await, irrigation_engine::Screen::Configuration);
    }

    #[tokio::test]
    async fn per_zone_soil_when_global_disabled() {
        let s = session();
        post(&s, "/api/welcome/new").await;
        let (status, body) = put(&s, "/api/setup/soil", json!({ "use_global_soil": false })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["setup"]["use_global_soil"], false);

        let (status, _) = put(
            &s,
            "/api/setup/zones/2",
            json!({ "plant_type": "persil", "soil_type": "sableux" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn setup_unknown_zone_is_not_found() {
        let s = session();
        post(&s, "/api/welcome/new").await;
        let (status, body) = put(&s, "/api/setup/zones/99", json!({ "plant_type": "radis" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn back_then_established() {
        let s = session();
        post(&s, "/api/welcome/new").await;
        let (_, body) = post(&s, "/api/setup/back").await;
        assert_eq!(body["screen"], "welcome");

        let (status, body) = post(&s, "/api/welcome/existing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["screen"], "dashboard");
        assert_eq!(body["planting"], "existing");
        assert_eq!(body["zones"][0]["plant_type"], "Tomates");

        let (_, body) = post(&s, "/api/reconfigure").await;
        assert_eq!(body["screen"], "welcome");
        assert_eq!(body["telemetry_running"], false);
    }

    #[tokio::test]
    async fn wrong_screen_is_conflict() {
        let s = session();
        let (status, _) = post(&s, "/api/reconfigure").await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = post(&s, "/api/pump").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);

        let (status, _) = put(&s, "/api/setup/soil", json!({ "global_soil": "sableux" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    // -- Dashboard commands ---------------------------------------------------

    #[tokio::test]
    async fn valve_and_pump_toggles() {
        let s = session();
        post(&s, "/api/welcome/existing").await;

        let (status, body) = post(&s, "/api/zones/1/valve").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["zones"][0]["valve_open"], true);
        assert_eq!(body["open_zones"], 2);
        assert_eq!(body["log"][0]["message"], "Zone 1 - Vanne ouverte");

        let (status, body) = post(&s, "/api/pump").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["pump_on"], true);
        assert_eq!(body["log"][0]["message"], "Pompe démarrée");

        s.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_valve_is_not_found() {
        let s = session();
        post(&s, "/api/welcome/existing").await;
        let (status, body) = post(&s, "/api/zones/42/valve").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("42"));
        s.shutdown().await;
    }
}
