//! Concrete HTTP/HTTPS/TCP probes against backend [`Target`]s.
//!
//! [`TargetProbe`] implements [`HealthChecker<Target>`] so it can be plugged
//! straight into a [`crate::HealthCheckWrapper`]; the wrapper drives the
//! interval/timeout/hysteresis machinery, this module only decides whether a
//! single probe succeeded.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use gateway_core::{Target, TargetKey};
use regex::Regex;

use crate::{HealthChecker, HealthStatus};

/// Transport a [`TargetProbe`] uses to reach a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Http,
    Https,
    Tcp,
}

/// A match against the probe response body: a literal substring, or a regex.
#[derive(Debug, Clone)]
pub enum ExpectedBody {
    Substring(String),
    Regex(Regex),
}

impl ExpectedBody {
    fn matches(&self, body: &str) -> bool {
        match self {
            ExpectedBody::Substring(s) => body.contains(s.as_str()),
            ExpectedBody::Regex(re) => re.is_match(body),
        }
    }
}

/// What a probe considers a passing response.
#[derive(Debug, Clone)]
pub struct ProbePolicy {
    kind: ProbeKind,
    endpoint: String,
    expected_status_codes: Vec<u16>,
    expected_body: Option<ExpectedBody>,
    headers: Vec<(String, String)>,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            kind: ProbeKind::Http,
            endpoint: "/".to_string(),
            expected_status_codes: vec![200, 201, 202, 204],
            expected_body: None,
            headers: Vec::new(),
        }
    }
}

impl ProbePolicy {
    pub fn builder() -> ProbePolicyBuilder {
        ProbePolicyBuilder::default()
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }
}

#[derive(Default)]
pub struct ProbePolicyBuilder {
    policy: ProbePolicy,
}

impl ProbePolicyBuilder {
    pub fn kind(mut self, kind: ProbeKind) -> Self {
        self.policy.kind = kind;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.policy.endpoint = endpoint.into();
        self
    }

    pub fn expected_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.policy.expected_status_codes = codes;
        self
    }

    pub fn expected_body(mut self, expected: ExpectedBody) -> Self {
        self.policy.expected_body = Some(expected);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.policy.headers.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> ProbePolicy {
        self.policy
    }
}

/// Side-channel detail recorded by the last probe of a target: response time
/// and error, neither of which fits in [`HealthStatus`] alone. Read by the
/// load balancer when it assembles a `TargetHealth` snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProbeDetail {
    pub response_time: Option<Duration>,
    pub last_error: Option<String>,
}

/// A [`HealthChecker<Target>`] that probes over HTTP(S) or raw TCP.
pub struct TargetProbe {
    policy: ProbePolicy,
    client: reqwest::Client,
    details: RwLock<HashMap<TargetKey, ProbeDetail>>,
}

impl TargetProbe {
    pub fn new(policy: ProbePolicy) -> Self {
        Self {
            policy,
            client: reqwest::Client::new(),
            details: RwLock::new(HashMap::new()),
        }
    }

    /// The response time and error recorded by the most recent probe of
    /// `key`, or the default (empty) detail if it has never been probed.
    pub fn detail(&self, key: &TargetKey) -> ProbeDetail {
        self.details
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    async fn probe_http(&self, target: &Target) -> Result<(), String> {
        let url = format!(
            "{}{}",
            target.base_url(),
            self.policy.endpoint
        );
        let mut request = self.client.get(&url);
        for (name, value) in &self.policy.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        if !self.policy.expected_status_codes.contains(&status) {
            return Err(format!("unexpected status {status}"));
        }

        if let Some(expected) = &self.policy.expected_body {
            let body = response.text().await.map_err(|e| e.to_string())?;
            if !expected.matches(&body) {
                return Err("response body did not match expected_body".to_string());
            }
        }

        Ok(())
    }

    async fn probe_tcp(&self, target: &Target) -> Result<(), String> {
        tokio::net::TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl HealthChecker<Target> for TargetProbe {
    async fn check(&self, target: &Target) -> HealthStatus {
        let start = std::time::Instant::now();
        let result = match self.policy.kind {
            ProbeKind::Tcp => self.probe_tcp(target).await,
            ProbeKind::Http | ProbeKind::Https => self.probe_http(target).await,
        };
        let elapsed = start.elapsed();

        let mut details = self.details.write().unwrap();
        let entry = details.entry(target.key()).or_default();
        entry.response_time = Some(elapsed);

        match result {
            Ok(()) => {
                entry.last_error = None;
                HealthStatus::Healthy
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(target = %target.key(), error = %err, "health probe failed");
                entry.last_error = Some(err);
                HealthStatus::Unhealthy
            }
        }
    }
}
