use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RouterError};

pub const MAX_IDENTIFIER_LEN: usize = 30;
pub const MAX_POST_URL_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Teams,
    PagerDuty,
}

impl RouteType {
    pub const ALL: [RouteType; 2] = [RouteType::Teams, RouteType::PagerDuty];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::PagerDuty => "pagerduty",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "teams" => Ok(Self::Teams),
            "pagerduty" => Ok(Self::PagerDuty),
            other => Err(RouterError::UnsupportedRouteType(other.to_string())),
        }
    }
}

/// One (identifier, route type) → destination mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub identifier: String,
    pub route_type: RouteType,
    /// Webhook URL for teams, routing key for pagerduty.
    pub post_url: String,
    pub description: String,
}

impl Route {
    /// Builds a route, falling back to the identifier when no description is given.
    pub fn new(
        identifier: impl Into<String>,
        route_type: RouteType,
        post_url: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let identifier = identifier.into();
        let description = description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| identifier.clone());

        Self {
            identifier,
            route_type,
            post_url: post_url.into(),
            description,
        }
    }

    /// Checks the route fits the mapping table and, for teams, that the
    /// destination is an absolute URL. PagerDuty routing keys are opaque.
    pub fn validate(&self) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(RouterError::InvalidRoute("identifier must not be empty".to_string()));
        }
        if self.identifier.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(RouterError::InvalidRoute(format!(
                "identifier longer than {} characters",
                MAX_IDENTIFIER_LEN
            )));
        }
        if self.post_url.is_empty() {
            return Err(RouterError::InvalidRoute("url must not be empty".to_string()));
        }
        if self.post_url.chars().count() > MAX_POST_URL_LEN {
            return Err(RouterError::InvalidRoute(format!(
                "url longer than {} characters",
                MAX_POST_URL_LEN
            )));
        }

        if self.route_type == RouteType::Teams {
            url::Url::parse(&self.post_url).map_err(|source| RouterError::InvalidUrl {
                url: self.post_url.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_type_parse() {
        assert_eq!("teams".parse::<RouteType>().unwrap(), RouteType::Teams);
        assert_eq!("pagerduty".parse::<RouteType>().unwrap(), RouteType::PagerDuty);

        let err = "slack".parse::<RouteType>().unwrap_err();
        assert!(matches!(err, RouterError::UnsupportedRouteType(ref t) if t == "slack"));

        // Matching is exact, the path segment is not normalized.
        assert!("Teams".parse::<RouteType>().is_err());
    }

    #[test]
    fn test_route_type_serde() {
        assert_eq!(serde_json::to_string(&RouteType::PagerDuty).unwrap(), "\"pagerduty\"");
        let parsed: RouteType = serde_json::from_str("\"teams\"").unwrap();
        assert_eq!(parsed, RouteType::Teams);
    }

    #[test]
    fn test_description_defaults_to_identifier() {
        let route = Route::new("platform", RouteType::Teams, "https://example.com/hook", None);
        assert_eq!(route.description, "platform");

        let route = Route::new("platform", RouteType::Teams, "https://example.com/hook", Some(String::new()));
        assert_eq!(route.description, "platform");

        let route = Route::new(
            "platform",
            RouteType::Teams,
            "https://example.com/hook",
            Some("Platform on-call".to_string()),
        );
        assert_eq!(route.description, "Platform on-call");
    }

    #[test]
    fn test_teams_route_requires_absolute_url() {
        let route = Route::new("platform", RouteType::Teams, "not a url", None);
        assert!(matches!(route.validate(), Err(RouterError::InvalidUrl { .. })));

        let route = Route::new("platform", RouteType::Teams, "/relative/path", None);
        assert!(matches!(route.validate(), Err(RouterError::InvalidUrl { .. })));

        let route = Route::new("platform", RouteType::Teams, "https://outlook.office.com/webhook/abc", None);
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_pagerduty_routing_key_is_opaque() {
        let route = Route::new("platform", RouteType::PagerDuty, "R0UT1NGK3Y", None);
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_route_length_limits() {
        let long_identifier = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        let route = Route::new(long_identifier, RouteType::PagerDuty, "key", None);
        assert!(matches!(route.validate(), Err(RouterError::InvalidRoute(_))));

        let route = Route::new("platform", RouteType::PagerDuty, "", None);
        assert!(matches!(route.validate(), Err(RouterError::InvalidRoute(_))));
    }
}
