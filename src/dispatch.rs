use crate::compiler::{compile_pagerduty_event, compile_teams_message};
use crate::delivery::WebhookClient;
use crate::error::Result;
use crate::event_alert::EventAlert;
use crate::route::RouteType;
use crate::store::RouteStore;

/// Turns an inbound alert into one outbound webhook call.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: WebhookClient,
    pagerduty_events_url: String,
}

impl Dispatcher {
    pub fn new(client: WebhookClient, pagerduty_events_url: impl Into<String>) -> Self {
        Self {
            client,
            pagerduty_events_url: pagerduty_events_url.into(),
        }
    }

    /// Parses `body`, resolves the route and delivers the compiled message.
    /// Nothing is retried.
    pub async fn notify(
        &self,
        store: &dyn RouteStore,
        route_type: RouteType,
        identifier: &str,
        body: &[u8],
    ) -> Result<()> {
        let alert = EventAlert::parse(body)?;
        log::info!(
            "{} event alert received for {}: {}",
            alert.metadata.status,
            identifier,
            alert.metadata.event_description
        );

        let route = store.get(identifier, route_type).await?;

        match route.route_type {
            RouteType::Teams => {
                let message = compile_teams_message(&alert);
                log::info!("Publishing message to Teams {}", identifier);
                self.client.post_json(&route.post_url, &message).await?;
            }
            RouteType::PagerDuty => {
                let event = compile_pagerduty_event(&alert, &route.post_url);
                log::info!("Opening PagerDuty incident for {}", identifier);
                self.client.post_json(&self.pagerduty_events_url, &event).await?;
            }
        }

        log::info!("✅ Delivered {} alert for {}", route_type, identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::error::RouterError;
    use crate::store::StaticRouteStore;
    use axum::{http::StatusCode, routing::post, Router};
    use std::time::Duration;

    const ALERT: &[u8] = br#"{"topic":"bosh.jobs","metadata":{"status":"Warning","eventDescription":"disk filling"}}"#;

    async fn endpoint(status: StatusCode) -> String {
        let app = Router::new().route("/hook", post(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/hook", addr)
    }

    fn setup(teams: &str, events_url: &str) -> (StaticRouteStore, Dispatcher) {
        let store = StaticRouteStore::new(vec![NotificationConfig {
            name: "platform".to_string(),
            teams: Some(teams.to_string()),
            pagerduty: Some("PLATFORMKEY".to_string()),
        }]);
        let client = WebhookClient::new(Duration::from_secs(5)).unwrap();
        (store, Dispatcher::new(client, events_url))
    }

    #[tokio::test]
    async fn test_notify_delivers_to_both_types() {
        let teams = endpoint(StatusCode::OK).await;
        let events = endpoint(StatusCode::CREATED).await;
        let (store, dispatcher) = setup(&teams, &events);

        dispatcher.notify(&store, RouteType::Teams, "platform", ALERT).await.unwrap();
        dispatcher.notify(&store, RouteType::PagerDuty, "platform", ALERT).await.unwrap();
    }

    #[tokio::test]
    async fn test_notify_reports_delivery_failure() {
        let teams = endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
        let (store, dispatcher) = setup(&teams, &teams);

        let result = dispatcher.notify(&store, RouteType::Teams, "platform", ALERT).await;
        assert!(matches!(result, Err(RouterError::DeliveryFailed(_))));
    }

    #[tokio::test]
    async fn test_notify_error_kinds() {
        let (store, dispatcher) = setup("http://127.0.0.1:9/hook", "http://127.0.0.1:9/hook");

        let result = dispatcher.notify(&store, RouteType::Teams, "unknown", ALERT).await;
        assert!(matches!(result, Err(RouterError::NotFound { .. })));

        let result = dispatcher.notify(&store, RouteType::Teams, "platform", b"[1, 2").await;
        assert!(matches!(result, Err(RouterError::MalformedInput(_))));

        let result = dispatcher.notify(&store, RouteType::Teams, "platform", br#"{"topic":"t"}"#).await;
        assert!(matches!(result, Err(RouterError::MissingFields(_))));
    }
}
