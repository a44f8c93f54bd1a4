use std::collections::HashMap;
use std::net::IpAddr;

use crate::rule::{compile_rule, CompiledPattern, CompiledRule, IpRule, RuleAction};

/// A compiled, immutable snapshot of the filter's rules: an exact-match table
/// and a priority-sorted CIDR list. Swapped in atomically on mutation via
/// `arc_swap::ArcSwap` so readers never observe a partially-updated ruleset.
pub(crate) struct RuleSet {
    exact: HashMap<IpAddr, CompiledRule>,
    cidrs: Vec<CompiledRule>,
}

impl RuleSet {
    pub(crate) fn compile(rules: &[IpRule]) -> Self {
        let mut exact = HashMap::new();
        let mut cidrs = Vec::new();

        for rule in rules {
            let Some(compiled) = compile_rule(rule) else {
                continue;
            };
            match compiled.pattern {
                CompiledPattern::Exact(addr) => {
                    exact.insert(addr, compiled);
                }
                CompiledPattern::Cidr(_) => cidrs.push(compiled),
            }
        }

        // Stable sort: ties resolve to original (insertion) order.
        cidrs.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self { exact, cidrs }
    }

    /// Exact match first; on miss, the first CIDR range (in descending
    /// priority order) containing `ip` wins.
    pub(crate) fn match_ip(&self, ip: IpAddr) -> Option<RuleAction> {
        if let Some(rule) = self.exact.get(&ip) {
            return Some(rule.action);
        }
        self.cidrs
            .iter()
            .find(|rule| match &rule.pattern {
                CompiledPattern::Cidr(net) => net.contains(&ip),
                CompiledPattern::Exact(_) => false,
            })
            .map(|rule| rule.action)
    }
}
