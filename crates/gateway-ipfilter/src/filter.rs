use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{FilterMode, IpFilterConfig};
use crate::rule::{IpRule, RuleAction};
use crate::ruleset::RuleSet;

/// The decision for one request's client IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    pub allowed: bool,
    pub action: RuleAction,
    pub matched: bool,
}

/// IP allow/block list filtering with exact-match and CIDR rules.
///
/// Rule mutation ([`IpFilter::add_rule`]/[`IpFilter::remove_rule`]) recompiles
/// the whole ruleset and swaps it in atomically via `arc_swap::ArcSwap`, so
/// concurrent [`IpFilter::check`] calls never observe a half-updated set of
/// rules.
pub struct IpFilter {
    mode: FilterMode,
    trust_proxy_enabled: bool,
    default_action: RuleAction,
    rules: ArcSwap<Vec<IpRule>>,
    compiled: ArcSwap<RuleSet>,
}

impl IpFilter {
    pub fn new(config: IpFilterConfig) -> Self {
        let compiled = RuleSet::compile(&config.rules);
        Self {
            mode: config.mode,
            trust_proxy_enabled: config.trust_proxy,
            default_action: config.default_action,
            rules: ArcSwap::from_pointee(config.rules),
            compiled: ArcSwap::from_pointee(compiled),
        }
    }

    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy_enabled
    }

    /// Classifies `ip`. In `Whitelist` mode, an unmatched IP is refused; in
    /// `Blacklist` mode an unmatched IP is admitted; in `Hybrid` mode the
    /// configured `default_action` applies. A `Log` match always admits.
    pub fn check(&self, ip: IpAddr) -> FilterDecision {
        let compiled = self.compiled.load();
        match compiled.match_ip(ip) {
            Some(action) => FilterDecision {
                allowed: action != RuleAction::Block,
                action,
                matched: true,
            },
            None => {
                let action = match self.mode {
                    FilterMode::Whitelist => RuleAction::Block,
                    FilterMode::Blacklist => RuleAction::Allow,
                    FilterMode::Hybrid => self.default_action,
                };
                FilterDecision {
                    allowed: action != RuleAction::Block,
                    action,
                    matched: false,
                }
            }
        }
    }

    /// Adds `rule` and recompiles the ruleset.
    pub fn add_rule(&self, rule: IpRule) {
        let mut rules = (**self.rules.load()).clone();
        rules.push(rule);
        self.swap_rules(rules);
    }

    /// Removes every rule whose pattern equals `pattern` and recompiles.
    pub fn remove_rule(&self, pattern: &str) {
        let mut rules = (**self.rules.load()).clone();
        rules.retain(|rule| rule.pattern != pattern);
        self.swap_rules(rules);
    }

    fn swap_rules(&self, rules: Vec<IpRule>) {
        let compiled = RuleSet::compile(&rules);
        self.compiled.store(Arc::new(compiled));
        self.rules.store(Arc::new(rules));
    }
}
