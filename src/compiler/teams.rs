use serde::Serialize;

use crate::event_alert::EventAlert;

// Legacy actionable message card accepted by Teams incoming webhooks.
const CARD_TYPE: &str = "MessageCard";
const CARD_CONTEXT: &str = "http://schema.org/extensions";
const OPEN_URI: &str = "OpenUri";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsMessage {
    #[serde(rename = "@type")]
    pub card_type: &'static str,
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(rename = "potentialAction", skip_serializing_if = "Vec::is_empty")]
    pub potential_actions: Vec<PotentialAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
    pub markdown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PotentialAction {
    #[serde(rename = "@type")]
    pub action_type: &'static str,
    pub name: &'static str,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub os: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl PotentialAction {
    fn open_uri(name: &'static str, uri: Option<String>) -> Self {
        Self {
            action_type: OPEN_URI,
            name,
            targets: vec![Target { os: "default", uri }],
        }
    }
}

pub fn compile_teams_message(alert: &EventAlert) -> TeamsMessage {
    let metadata = &alert.metadata;

    TeamsMessage {
        card_type: CARD_TYPE,
        context: CARD_CONTEXT,
        theme_color: metadata.status_color.clone(),
        title: format!("{}: {}", metadata.status, metadata.event_description),
        summary: alert.publisher.clone(),
        sections: vec![Section {
            activity_title: metadata.foundation.clone(),
            facts: vec![
                Fact { name: "Topic", value: Some(alert.topic.clone()) },
                Fact { name: "Job", value: metadata.job.clone() },
                Fact { name: "Value", value: metadata.value.clone() },
                Fact { name: "Event Type", value: metadata.event_type.clone() },
                Fact { name: "Publisher", value: alert.publisher.clone() },
            ],
            markdown: false,
        }],
        potential_actions: vec![
            PotentialAction::open_uri("View in HealthWatch", metadata.url.clone()),
            PotentialAction::open_uri("Refer Documentation", metadata.docs_url.clone()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn disk_alert() -> EventAlert {
        EventAlert::parse(
            br##"{
                "publisher": "healthwatch",
                "topic": "bosh.jobs",
                "metadata": {
                    "status": "Critical",
                    "statusColor": "#FF0000",
                    "value": "98",
                    "job": "diego_cell",
                    "foundation": "prod-east",
                    "eventType": "disk",
                    "eventDescription": "disk full",
                    "url": "https://healthwatch.example.com/alerts/1",
                    "docsUrl": "https://docs.example.com/disk"
                }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_title_and_facts() {
        let message = compile_teams_message(&disk_alert());

        assert_eq!(message.title, "Critical: disk full");
        assert_eq!(message.theme_color.as_deref(), Some("#FF0000"));
        assert_eq!(message.summary.as_deref(), Some("healthwatch"));
        assert_eq!(message.sections.len(), 1);

        let names: Vec<&str> = message.sections[0].facts.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Topic", "Job", "Value", "Event Type", "Publisher"]);
        assert_eq!(message.sections[0].facts[0].value.as_deref(), Some("bosh.jobs"));
        assert_eq!(message.sections[0].activity_title.as_deref(), Some("prod-east"));
    }

    #[test]
    fn test_open_uri_actions() {
        let message = compile_teams_message(&disk_alert());

        assert_eq!(message.potential_actions.len(), 2);
        assert_eq!(message.potential_actions[0].name, "View in HealthWatch");
        assert_eq!(
            message.potential_actions[0].targets[0].uri.as_deref(),
            Some("https://healthwatch.example.com/alerts/1")
        );
        assert_eq!(message.potential_actions[1].name, "Refer Documentation");
        assert_eq!(
            message.potential_actions[1].targets[0].uri.as_deref(),
            Some("https://docs.example.com/disk")
        );
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(compile_teams_message(&disk_alert())).unwrap();

        assert_eq!(value["@type"], "MessageCard");
        assert_eq!(value["@context"], "http://schema.org/extensions");
        assert_eq!(value["themeColor"], "#FF0000");
        assert_eq!(value["sections"][0]["activityTitle"], "prod-east");
        assert_eq!(value["sections"][0]["facts"][3], json!({"name": "Event Type", "value": "disk"}));
        assert_eq!(value["potentialAction"][0]["@type"], "OpenUri");
        assert_eq!(value["potentialAction"][0]["targets"][0]["os"], "default");
    }

    #[test]
    fn test_minimal_alert_omits_absent_values() {
        let alert = EventAlert::parse(br#"{"topic":"t","metadata":{"status":"Warning","eventDescription":"slow"}}"#)
            .unwrap();
        let value = serde_json::to_value(compile_teams_message(&alert)).unwrap();

        assert_eq!(value["title"], "Warning: slow");
        assert!(value.get("themeColor").is_none());
        assert!(value.get("summary").is_none());
        // Facts keep their slot even when the value is absent.
        assert_eq!(value["sections"][0]["facts"].as_array().unwrap().len(), 5);
        assert_eq!(value["sections"][0]["facts"][1], json!({"name": "Job"}));
    }
}
