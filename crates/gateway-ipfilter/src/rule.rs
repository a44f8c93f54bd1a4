use std::net::IpAddr;

use ipnet::IpNet;

/// What a matching [`IpRule`] does to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Allow,
    Block,
    /// Records the match via `tracing::info!` but does not refuse the request.
    Log,
}

/// A single user-supplied rule before compilation.
///
/// `pattern` is either a bare IP address (`"203.0.113.5"`) or CIDR notation
/// (`"203.0.113.0/24"`); invalid patterns are skipped at compile time with a
/// warning rather than failing construction.
#[derive(Debug, Clone)]
pub struct IpRule {
    pub pattern: String,
    pub action: RuleAction,
    pub priority: u32,
}

impl IpRule {
    pub fn new(pattern: impl Into<String>, action: RuleAction, priority: u32) -> Self {
        Self {
            pattern: pattern.into(),
            action,
            priority,
        }
    }
}

/// A rule after its pattern has been parsed as either an exact address or a
/// CIDR range.
#[derive(Debug, Clone)]
pub(crate) enum CompiledPattern {
    Exact(IpAddr),
    Cidr(IpNet),
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) pattern: CompiledPattern,
    pub(crate) action: RuleAction,
    pub(crate) priority: u32,
}

pub(crate) fn compile_rule(rule: &IpRule) -> Option<CompiledRule> {
    if let Ok(addr) = rule.pattern.parse::<IpAddr>() {
        return Some(CompiledRule {
            pattern: CompiledPattern::Exact(addr),
            action: rule.action,
            priority: rule.priority,
        });
    }
    if let Ok(net) = rule.pattern.parse::<IpNet>() {
        return Some(CompiledRule {
            pattern: CompiledPattern::Cidr(net),
            action: rule.action,
            priority: rule.priority,
        });
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(pattern = %rule.pattern, "skipping unparseable ip filter rule");

    None
}
