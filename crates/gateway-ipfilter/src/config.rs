use crate::rule::{IpRule, RuleAction};

/// How an unmatched IP is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Default-deny: only explicit `Allow` rules admit a request.
    Whitelist,
    /// Default-allow: only explicit `Block` rules refuse a request.
    Blacklist,
    /// Rules apply by priority; an unmatched IP falls through to `default_action`.
    Hybrid,
}

/// Configuration for [`crate::IpFilter`].
pub struct IpFilterConfig {
    pub(crate) mode: FilterMode,
    pub(crate) rules: Vec<IpRule>,
    pub(crate) trust_proxy: bool,
    pub(crate) default_action: RuleAction,
}

/// Builder for [`IpFilterConfig`].
pub struct IpFilterConfigBuilder {
    mode: FilterMode,
    rules: Vec<IpRule>,
    trust_proxy: bool,
    default_action: Option<RuleAction>,
    has_whitelist: bool,
}

impl Default for IpFilterConfigBuilder {
    fn default() -> Self {
        Self::new(FilterMode::Blacklist)
    }
}

impl IpFilterConfigBuilder {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            rules: Vec::new(),
            trust_proxy: false,
            default_action: None,
            has_whitelist: false,
        }
    }

    /// Adds every entry as an `Allow` rule at priority 100. In `Hybrid` mode,
    /// the presence of a whitelist also flips the unmatched-IP default to
    /// `Block` (see [`Self::default_action`]), unless overridden explicitly.
    pub fn whitelist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut any = false;
        self.rules.extend(entries.into_iter().map(|pattern| {
            any = true;
            IpRule::new(pattern, RuleAction::Allow, 100)
        }));
        self.has_whitelist |= any;
        self
    }

    /// Adds every entry as a `Block` rule at priority 90.
    pub fn blacklist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(
            entries
                .into_iter()
                .map(|pattern| IpRule::new(pattern, RuleAction::Block, 90)),
        );
        self
    }

    /// Adds a rule with an explicit priority (used directly by `Hybrid` mode).
    pub fn rule(mut self, rule: IpRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// When set, the client IP is derived from `X-Forwarded-For`/`X-Real-IP`
    /// before falling back to the socket peer address.
    pub fn trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// The action applied in `Hybrid` mode when no rule matches. Overrides
    /// the whitelist-presence-derived default (see [`Self::whitelist`]).
    pub fn default_action(mut self, action: RuleAction) -> Self {
        self.default_action = Some(action);
        self
    }

    pub fn build(self) -> IpFilterConfig {
        // Unmatched-IP default: Block when a whitelist is present, else
        // Allow. An explicit `default_action` call always wins.
        let default_action = self.default_action.unwrap_or(if self.has_whitelist {
            RuleAction::Block
        } else {
            RuleAction::Allow
        });
        IpFilterConfig {
            mode: self.mode,
            rules: self.rules,
            trust_proxy: self.trust_proxy,
            default_action,
        }
    }
}
