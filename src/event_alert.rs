use serde::Deserialize;

use crate::error::{Result, RouterError};

/// A validated inbound event alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAlert {
    pub publisher: Option<String>,
    pub topic: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub status: String,
    pub event_description: String,
    pub status_color: Option<String>,
    pub value: Option<String>,
    pub job: Option<String>,
    pub index: Option<String>,
    pub ip: Option<String>,
    pub deployment: Option<String>,
    pub foundation: Option<String>,
    pub event_type: Option<String>,
    pub url: Option<String>,
    pub docs_url: Option<String>,
}

// Wire shape as published by the alerting system. Everything is optional here
// so that absent mandatory fields are reported together instead of failing on
// the first one.
#[derive(Debug, Default, Deserialize)]
struct RawEventAlert {
    publisher: Option<String>,
    topic: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    status: Option<String>,
    event_description: Option<String>,
    status_color: Option<String>,
    value: Option<String>,
    job: Option<String>,
    index: Option<String>,
    ip: Option<String>,
    deployment: Option<String>,
    foundation: Option<String>,
    event_type: Option<String>,
    url: Option<String>,
    docs_url: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

impl EventAlert {
    /// Decodes and validates one alert document.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: RawEventAlert = serde_json::from_slice(body).map_err(RouterError::MalformedInput)?;
        Self::validate(raw)
    }

    fn validate(raw: RawEventAlert) -> Result<Self> {
        let metadata = raw.metadata.unwrap_or_default();

        let topic = present(raw.topic);
        let status = present(metadata.status);
        let event_description = present(metadata.event_description);

        match (topic, status, event_description) {
            (Some(topic), Some(status), Some(event_description)) => Ok(EventAlert {
                publisher: present(raw.publisher),
                topic,
                metadata: Metadata {
                    status,
                    event_description,
                    status_color: present(metadata.status_color),
                    value: present(metadata.value),
                    job: present(metadata.job),
                    index: present(metadata.index),
                    ip: present(metadata.ip),
                    deployment: present(metadata.deployment),
                    foundation: present(metadata.foundation),
                    event_type: present(metadata.event_type),
                    url: present(metadata.url),
                    docs_url: present(metadata.docs_url),
                },
            }),
            (topic, status, event_description) => {
                let mut missing = Vec::new();
                if topic.is_none() {
                    missing.push("topic");
                }
                if status.is_none() {
                    missing.push("metadata.status");
                }
                if event_description.is_none() {
                    missing.push("metadata.eventDescription");
                }
                Err(RouterError::MissingFields(missing))
            }
        }
    }
}
