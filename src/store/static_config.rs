use async_trait::async_trait;

use super::RouteStore;
use crate::config::NotificationConfig;
use crate::error::{Result, RouterError};
use crate::route::{Route, RouteType};

/// Read-only store derived from the `[[notifications]]` section of the
/// application config. Changing routes means editing the file and restarting.
#[derive(Debug, Clone)]
pub struct StaticRouteStore {
    notifications: Vec<NotificationConfig>,
}

impl StaticRouteStore {
    pub fn new(notifications: Vec<NotificationConfig>) -> Self {
        Self { notifications }
    }

    // One route per non-empty destination, teams first, in document order.
    fn routes(&self) -> impl Iterator<Item = Route> + '_ {
        self.notifications.iter().flat_map(|entry| {
            [
                (RouteType::Teams, entry.teams.as_deref()),
                (RouteType::PagerDuty, entry.pagerduty.as_deref()),
            ]
            .into_iter()
            .filter_map(move |(route_type, destination)| match destination {
                Some(destination) if !destination.is_empty() => Some(Route::new(
                    entry.name.clone(),
                    route_type,
                    destination,
                    Some(entry.name.clone()),
                )),
                _ => None,
            })
        })
    }
}

#[async_trait]
impl RouteStore for StaticRouteStore {
    async fn list(&self) -> Result<Vec<Route>> {
        let routes: Vec<Route> = self.routes().collect();
        if routes.is_empty() {
            return Err(RouterError::EmptyMapping);
        }
        Ok(routes)
    }

    async fn get(&self, identifier: &str, route_type: RouteType) -> Result<Route> {
        // First entry wins when a name is listed more than once.
        self.routes()
            .find(|route| route.identifier == identifier && route.route_type == route_type)
            .ok_or_else(|| RouterError::not_found(identifier, route_type))
    }

    async fn create(&self, _route: &Route) -> Result<()> {
        Err(RouterError::Unsupported("create"))
    }

    async fn delete(&self, _identifier: &str, _route_type: RouteType) -> Result<()> {
        Err(RouterError::Unsupported("delete"))
    }

    async fn close(&self) {}

    fn is_read_only(&self) -> bool {
        true
    }
}
