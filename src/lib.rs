pub mod api;
pub mod compiler;
pub mod config;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod event_alert;
pub mod route;
pub mod store;

pub use api::{create_router, ApiResponse, AppState};
pub use config::{AppConfig, DatabaseConfig, NotificationConfig};
pub use delivery::WebhookClient;
pub use dispatch::Dispatcher;
pub use error::RouterError;
pub use event_alert::EventAlert;
pub use route::{Route, RouteType};
pub use store::{open_store, MySqlRouteStore, RouteStore, StaticRouteStore};
