//! REST API for the load planner.
//!
//! Provides HTTP endpoints for metrics, layout, live layout streaming and
//! report export. Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{AppConfig, PersistenceConfig, ReportSettings};
use crate::geometry::{OverlapPair, find_overlaps, min_stack_gap};
use crate::layout::{
    ItemColor, LayoutConfig, LayoutEvent, LayoutPlan, PlacedItem, plan_layout,
    plan_layout_with_progress,
};
use crate::metrics::{AggregateResult, ContainerClass, aggregate};
use crate::model::{ItemDescriptor, RawField};
use crate::persistence::{ShipmentRecord, save_shipment_background};
use crate::report::ReportDocument;
use crate::scene::SceneCapture;
use crate::types::Vec3;

const REPORT_ARCHIVE_NAME: &str = "sea_freight_report.zip";

#[derive(Clone, Debug)]
struct ApiState {
    layout: LayoutConfig,
    report: ReportSettings,
    persistence: PersistenceConfig,
}

impl ApiState {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            layout: config.layout.layout_config(),
            report: config.report.clone(),
            persistence: config.persistence.clone(),
        }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>Sea Freight Planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure shared by all planning endpoints.
///
/// The order of `items` determines stacking.
#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "length": 40, "width": 30, "height": 20, "weight": 5, "fragile": false, "heavy": false },
            { "length": "120", "width": "80", "height": "60", "weight": "", "fragile": true, "heavy": false }
        ]
    })
)]
pub struct PlanRequest {
    pub items: Vec<ItemDescriptor>,
}

/// Diagnostics computed over a layout.
///
/// # Fields
/// * `overlaps` - Pairs of item indices whose boxes share volume (expected empty)
/// * `min_stack_gap` - Smallest vertical gap inside a column, if any column is stacked
/// * `columns` - Number of columns used
/// * `degenerate_items` - Items placed with a zero extent
#[derive(Serialize, Debug, ToSchema)]
pub struct LayoutDiagnostics {
    pub overlaps: Vec<OverlapPair>,
    pub min_stack_gap: Option<f64>,
    pub columns: usize,
    pub degenerate_items: usize,
}

impl LayoutDiagnostics {
    fn from_plan(plan: &LayoutPlan) -> Self {
        Self {
            overlaps: find_overlaps(&plan.placed),
            min_stack_gap: min_stack_gap(&plan.placed),
            columns: plan.column_count(),
            degenerate_items: plan.degenerate_count(),
        }
    }
}

/// Response of the combined planning endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct PlanResponse {
    pub metrics: AggregateResult,
    pub layout: Vec<PlacedItem>,
    pub diagnostics: LayoutDiagnostics,
}

impl PlanResponse {
    /// Computes metrics, layout and diagnostics for one item list.
    pub fn build(items: &[ItemDescriptor], config: &LayoutConfig) -> Self {
        let metrics = aggregate(items);
        let plan = plan_layout(items, config);
        let diagnostics = LayoutDiagnostics::from_plan(&plan);

        Self {
            metrics,
            layout: plan.placed,
            diagnostics,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn parse_plan_request(
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Vec<ItemDescriptor>, Response> {
    match payload {
        Ok(Json(request)) => Ok(request.items),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_plan,
        handle_plan_stream,
        handle_metrics,
        handle_layout,
        handle_report,
        handle_layout_svg,
        handle_health
    ),
    components(
        schemas(
            PlanRequest,
            PlanResponse,
            LayoutDiagnostics,
            ItemDescriptor,
            RawField,
            AggregateResult,
            ContainerClass,
            PlacedItem,
            ItemColor,
            Vec3,
            OverlapPair,
            LayoutEvent,
            HealthResponse,
            ErrorResponse
        )
    ),
    tags((name = "planning", description = "Endpoints for load metrics, layout and reports"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/plan", post(handle_plan))
        .route("/plan_stream", post(handle_plan_stream))
        .route("/metrics", post(handle_metrics))
        .route("/layout", post(handle_layout))
        .route("/report", post(handle_report))
        .route("/layout.svg", post(handle_layout_svg))
        .route("/health", get(handle_health))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: AppConfig) {
    let api_config = config.api.clone();
    let app = router(ApiState::from_config(&config));

    let addr = api_config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "🚀 Server running on http://{}:{}",
        api_config.display_host(),
        api_config.port()
    );
    if api_config.binds_to_all_interfaces() && api_config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", api_config.port());
    }
    info!("📦 API Endpoints: POST /plan, /plan_stream, /metrics, /layout, /report, /layout.svg");
    info!("📑 Documentation: GET /docs, /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /plan endpoint.
///
/// Computes metrics and layout for the item list and hands the shipment to
/// the persistence service in the background.
///
/// # Parameters
/// * `payload` - JSON payload with the ordered item list
///
/// # Returns
/// JSON response with metrics, placed items and layout diagnostics
#[utoipa::path(
    post,
    path = "/plan",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Metrics and layout computed", body = PlanResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let items = match parse_plan_request(payload) {
        Ok(items) => items,
        Err(response) => return response,
    };

    info!("📥 New plan request: {} items", items.len());
    let response = PlanResponse::build(&items, &state.layout);
    info!(
        "📦 Result: {:.3} m³, {} kg, {} ({} columns)",
        response.metrics.total_volume_cbm,
        response.metrics.total_weight_kg,
        response.metrics.recommended_container,
        response.diagnostics.columns
    );
    if !response.diagnostics.overlaps.is_empty() {
        warn!(
            "⚠️ Layout contains {} overlapping pairs",
            response.diagnostics.overlaps.len()
        );
    }

    let record = ShipmentRecord::new(items, &response.metrics);
    let _save_task = save_shipment_background(&state.persistence, record);

    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /plan_stream endpoint (SSE).
///
/// Streams layout events in real-time as Server-Sent Events (text/event-stream).
/// The frontend can build the scene step by step without waiting for the full plan.
#[utoipa::path(
    post,
    path = "/plan_stream",
    request_body = PlanRequest,
    responses(
        (
            status = 200,
            description = "Streams layout events in real-time",
            content_type = "text/event-stream",
            body = LayoutEvent
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_plan_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let items = match parse_plan_request(payload) {
        Ok(items) => items,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let config = state.layout;

    tokio::task::spawn_blocking(move || {
        let mut receiver_open = true;
        let _ = plan_layout_with_progress(&items, &config, |evt| {
            if !receiver_open {
                return;
            }
            if let Ok(json) = serde_json::to_string(evt) {
                // Receiver has closed the stream; remaining events are discarded.
                receiver_open = tx.blocking_send(json).is_ok();
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /metrics endpoint.
#[utoipa::path(
    post,
    path = "/metrics",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Aggregate metrics", body = AggregateResult),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_metrics(payload: Result<Json<PlanRequest>, JsonRejection>) -> impl IntoResponse {
    match parse_plan_request(payload) {
        Ok(items) => (StatusCode::OK, Json(aggregate(&items))).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /layout endpoint.
#[utoipa::path(
    post,
    path = "/layout",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Placed items in input order", body = [PlacedItem]),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_layout(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    match parse_plan_request(payload) {
        Ok(items) => {
            let plan = plan_layout(&items, &state.layout);
            (StatusCode::OK, Json(plan.placed)).into_response()
        }
        Err(response) => response,
    }
}

/// Handler for POST /report endpoint.
///
/// Returns a zip archive with the text report and, when the layout is
/// renderable, the SVG snapshot.
#[utoipa::path(
    post,
    path = "/report",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Report archive", content_type = "application/zip", body = String),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Report could not be packaged", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_report(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let items = match parse_plan_request(payload) {
        Ok(items) => items,
        Err(response) => return response,
    };

    let metrics = aggregate(&items);
    let plan = plan_layout(&items, &state.layout);
    let capture = state.report.scene_capture();
    let document = ReportDocument::build(
        &items,
        &metrics,
        &plan.placed,
        &capture,
        state.report.options(),
    );

    match document.to_archive_bytes() {
        Ok(bytes) => {
            info!(
                "📄 Report exported: {} items, {} pages",
                items.len(),
                document.pages.len()
            );
            let disposition = format!("attachment; filename=\"{REPORT_ARCHIVE_NAME}\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => {
            error!("❌ Report export failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Report export failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /layout.svg endpoint.
#[utoipa::path(
    post,
    path = "/layout.svg",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Front-elevation snapshot", content_type = "image/svg+xml", body = String),
        (status = NOT_FOUND, description = "No item has all three dimensions", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_layout_svg(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let items = match parse_plan_request(payload) {
        Ok(items) => items,
        Err(response) => return response,
    };

    let plan = plan_layout(&items, &state.layout);
    match state.report.scene_capture().capture_scene_image(&plan.placed) {
        Some(image) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, image.media_type)],
            image.data,
        )
            .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "Nothing to render",
            "No item has all three dimensions",
        ),
    }
}

/// Handler for GET /health endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = HealthResponse)),
    tag = "planning"
)]
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
