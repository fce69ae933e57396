use crate::route::RouteType;

pub type Result<T, E = RouterError> = std::result::Result<T, E>;

/// Failure kinds surfaced by the route stores, the alert parser and delivery.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("malformed request body: {0}")]
    MalformedInput(#[source] serde_json::Error),

    #[error("missing mandatory fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("unsupported route type {0:?}, expected one of: teams, pagerduty")]
    UnsupportedRouteType(String),

    #[error("invalid URL {url:?} for teams route")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no {route_type} route found for identifier {identifier}")]
    NotFound {
        identifier: String,
        route_type: RouteType,
    },

    #[error("a {route_type} route for identifier {identifier} already exists")]
    Conflict {
        identifier: String,
        route_type: RouteType,
    },

    #[error("{0} is not supported by the read-only static route store")]
    Unsupported(&'static str),

    #[error("route store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("integrity check failed: {0}")]
    IntegrityError(String),

    #[error("no routes configured in the notifications section")]
    EmptyMapping,

    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

impl RouterError {
    pub(crate) fn not_found(identifier: &str, route_type: RouteType) -> Self {
        Self::NotFound {
            identifier: identifier.to_string(),
            route_type,
        }
    }
}
