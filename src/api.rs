use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::{error::Error as _, fmt::Write as _, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::dispatch::Dispatcher;
use crate::error::RouterError;
use crate::route::{Route, RouteType};
use crate::store::RouteStore;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared per-process context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RouteStore>,
    pub dispatcher: Dispatcher,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    #[serde(alias = "URL")]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl RouterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) | Self::MissingFields(_) | Self::InvalidRoute(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedRouteType(_) | Self::InvalidUrl { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unsupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            Self::StoreUnavailable(_) | Self::IntegrityError(_) | Self::EmptyMapping => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Full source chain, for logs only.
    fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(out, ": {}", cause);
            source = cause.source();
        }
        out
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("❌ Request failed ({}): {}", status, self.describe());
        } else {
            log::warn!("Request rejected ({}): {}", status, self.describe());
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/routes", get(list_routes))
        // Notify shares the management path so PUT/DELETE/POST resolve to one route.
        .route(
            "/:route_type/:identifier",
            put(create_route).delete(remove_route).post(notify),
        )
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(REQUEST_TIMEOUT)))
        .with_state(Arc::new(state))
}

async fn index(State(state): State<Arc<AppState>>) -> String {
    let mut usage = String::new();
    let _ = writeln!(usage, "{{type}} ==> teams or pagerduty");
    let _ = writeln!(usage, "{{identifier}} ==> unique tag for respective teams/pagerduty endpoint");
    let _ = writeln!(usage, "ROUTE \"/routes\" is servicing on HTTP method GET");
    if state.store.is_read_only() {
        let _ = writeln!(usage, "Route management is disabled, mappings are read from the config file");
    } else {
        let _ = writeln!(usage, "ROUTE \"/{{type}}/{{identifier}}\" is servicing on HTTP method PUT,DELETE");
    }
    for route_type in RouteType::ALL {
        let _ = writeln!(usage, "ROUTE \"/{}/{{identifier}}\" is servicing on HTTP method POST", route_type);
    }
    usage
}

async fn list_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Route>>>, RouterError> {
    let routes = state.store.list().await?;
    log::debug!("Listing {} route mappings", routes.len());
    Ok(Json(ApiResponse::success(routes)))
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    Path((route_type, identifier)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<Route>>), RouterError> {
    let route_type: RouteType = route_type.parse()?;
    if state.store.is_read_only() {
        return Err(RouterError::Unsupported("create"));
    }
    let request: CreateRouteRequest = serde_json::from_slice(&body).map_err(RouterError::MalformedInput)?;

    let route = Route::new(identifier, route_type, request.url, request.description);
    route.validate()?;

    state.store.create(&route).await?;
    log::info!(
        "Added new mapping entry for {} with type {}",
        route.identifier,
        route.route_type
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::success(route))))
}

async fn remove_route(
    State(state): State<Arc<AppState>>,
    Path((route_type, identifier)): Path<(String, String)>,
) -> Result<Json<ApiResponse<String>>, RouterError> {
    let route_type: RouteType = route_type.parse()?;

    state.store.delete(&identifier, route_type).await?;
    log::info!("Removed {} mapping for identifier {}", route_type, identifier);
    Ok(Json(ApiResponse::success(format!(
        "removed {} route for {}",
        route_type, identifier
    ))))
}

async fn notify(
    State(state): State<Arc<AppState>>,
    Path((route_type, identifier)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ApiResponse<String>>, RouterError> {
    let route_type: RouteType = route_type.parse()?;

    state
        .dispatcher
        .notify(state.store.as_ref(), route_type, &identifier, &body)
        .await?;
    Ok(Json(ApiResponse::success(format!(
        "alert delivered to {} route {}",
        route_type, identifier
    ))))
}
