//! IP allow/block list filtering with exact-match and CIDR rules.
//!
//! Three modes: [`FilterMode::Whitelist`] (default-deny), [`FilterMode::Blacklist`]
//! (default-allow), and [`FilterMode::Hybrid`] (priority rules with a
//! configurable default). Rules are compiled into an exact-match table plus a
//! priority-sorted CIDR list and swapped in atomically on mutation.

mod client_ip;
mod config;
mod error;
mod filter;
mod rule;
mod ruleset;

pub use client_ip::derive_client_ip;
pub use config::{FilterMode, IpFilterConfig, IpFilterConfigBuilder};
pub use error::IpFilterError;
pub use filter::{FilterDecision, IpFilter};
pub use rule::{IpRule, RuleAction};
