//! Pure transforms from a validated [`EventAlert`](crate::EventAlert) into the
//! payload a destination service expects.

pub mod pagerduty;
pub mod teams;

pub use pagerduty::{compile_pagerduty_event, PagerDutyEvent, PAGERDUTY_EVENTS_URL};
pub use teams::{compile_teams_message, TeamsMessage};
