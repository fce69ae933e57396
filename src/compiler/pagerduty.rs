use serde::Serialize;

use crate::event_alert::EventAlert;

/// Events API v2 enqueue endpoint.
pub const PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

const TRIGGER: &str = "trigger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerDutyEvent {
    pub payload: Payload,
    pub routing_key: String,
    pub links: Vec<Link>,
    pub event_action: &'static str,
    pub client: String,
    pub client_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub summary: String,
    pub source: String,
    pub severity: String,
    pub component: String,
    pub group: String,
    pub class: String,
    pub custom_details: CustomDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomDetails {
    pub value: String,
    pub ip: String,
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub text: &'static str,
}

fn text(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

/// The route's `post_url` is the service's integration routing key here,
/// the event itself always goes to the events endpoint.
pub fn compile_pagerduty_event(alert: &EventAlert, routing_key: &str) -> PagerDutyEvent {
    let metadata = &alert.metadata;
    let foundation = text(&metadata.foundation);
    let summary = match metadata.foundation {
        Some(ref foundation) => format!("{}: {}", foundation, metadata.event_description),
        None => metadata.event_description.clone(),
    };

    PagerDutyEvent {
        routing_key: routing_key.to_string(),
        event_action: TRIGGER,
        payload: Payload {
            summary,
            source: foundation,
            severity: metadata.status.to_lowercase(),
            component: alert.topic.clone(),
            group: text(&metadata.job),
            class: text(&metadata.event_type),
            custom_details: CustomDetails {
                value: text(&metadata.value),
                ip: text(&metadata.ip),
                index: text(&metadata.index),
            },
        },
        links: metadata
            .docs_url
            .iter()
            .map(|href| Link {
                href: href.clone(),
                text: "Refer Documentation",
            })
            .collect(),
        client: text(&alert.publisher),
        client_url: text(&metadata.url),
    }
}
