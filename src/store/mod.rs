use anyhow::Result as AnyResult;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::route::{Route, RouteType};

pub mod mysql;
pub mod static_config;

pub use mysql::MySqlRouteStore;
pub use static_config::StaticRouteStore;

/// Storage-agnostic access to the (identifier, route type) mapping table.
///
/// Implementations are shared across concurrent requests and must be safe to
/// call from any task.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// All known routes. An empty list is valid.
    async fn list(&self) -> Result<Vec<Route>>;

    /// Fails with `NotFound` when no route matches the compound key.
    async fn get(&self, identifier: &str, route_type: RouteType) -> Result<Route>;

    /// Fails with `Conflict` when the compound key is already taken.
    async fn create(&self, route: &Route) -> Result<()>;

    /// Fails with `NotFound` when the compound key is absent.
    async fn delete(&self, identifier: &str, route_type: RouteType) -> Result<()>;

    /// Releases held connections. Safe to call more than once.
    async fn close(&self);

    fn is_read_only(&self) -> bool {
        false
    }
}

/// Opens the store selected by `enable_mysql`. Failing to reach the database
/// is fatal to startup.
pub async fn open_store(config: &AppConfig) -> AnyResult<Arc<dyn RouteStore>> {
    if config.enable_mysql {
        let store = MySqlRouteStore::connect(&config.database).await?;
        Ok(Arc::new(store))
    } else {
        log::info!(
            "MySQL disabled, serving {} notification entries from config",
            config.notifications.len()
        );
        Ok(Arc::new(StaticRouteStore::new(config.notifications.clone())))
    }
}
