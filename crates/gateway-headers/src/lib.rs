//! Security response headers.
//!
//! [`SecurityHeaders`] is a stateless, builder-configured injector: it owns no
//! interior mutability because every header it applies is a pure function of
//! its configuration and the one fact it reads off the request, whether the
//! connection is secure.

use std::collections::HashMap;

/// Which headers to set and how, built with [`SecurityHeadersBuilder`].
pub struct SecurityHeaders {
    content_security_policy: Option<String>,
    hsts: Option<HstsConfig>,
    x_frame_options: Option<String>,
    x_content_type_options: bool,
    x_xss_protection: bool,
    referrer_policy: Option<String>,
    permissions_policy: Option<String>,
    cross_origin_opener_policy: Option<String>,
    cross_origin_embedder_policy: Option<String>,
    cross_origin_resource_policy: Option<String>,
    remove: Vec<String>,
    custom: HashMap<String, String>,
}

/// Strict-Transport-Security parameters, applied only to HTTPS responses.
#[derive(Debug, Clone)]
pub struct HstsConfig {
    pub max_age_secs: u64,
    pub include_subdomains: bool,
    pub preload: bool,
}

impl HstsConfig {
    fn to_header_value(&self) -> String {
        let mut value = format!("max-age={}", self.max_age_secs);
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        SecurityHeadersBuilder::new().build()
    }
}

impl SecurityHeaders {
    pub fn builder() -> SecurityHeadersBuilder {
        SecurityHeadersBuilder::new()
    }

    /// Computes the headers to set and the headers to remove for a response.
    ///
    /// `secure` should be `req.secure OR X-Forwarded-Proto: https`, per the
    /// gateway's HTTPS-detection convention.
    pub fn apply(&self, secure: bool) -> (Vec<(String, String)>, Vec<String>) {
        let mut set: Vec<(String, String)> = Vec::new();

        if let Some(csp) = &self.content_security_policy {
            set.push(("Content-Security-Policy".to_string(), csp.clone()));
        }
        if secure {
            if let Some(hsts) = &self.hsts {
                set.push(("Strict-Transport-Security".to_string(), hsts.to_header_value()));
            }
        }
        if let Some(value) = &self.x_frame_options {
            set.push(("X-Frame-Options".to_string(), value.clone()));
        }
        if self.x_content_type_options {
            set.push(("X-Content-Type-Options".to_string(), "nosniff".to_string()));
        }
        if self.x_xss_protection {
            set.push(("X-XSS-Protection".to_string(), "1; mode=block".to_string()));
        }
        if let Some(value) = &self.referrer_policy {
            set.push(("Referrer-Policy".to_string(), value.clone()));
        }
        if let Some(value) = &self.permissions_policy {
            set.push(("Permissions-Policy".to_string(), value.clone()));
        }
        if let Some(value) = &self.cross_origin_opener_policy {
            set.push(("Cross-Origin-Opener-Policy".to_string(), value.clone()));
        }
        if let Some(value) = &self.cross_origin_embedder_policy {
            set.push(("Cross-Origin-Embedder-Policy".to_string(), value.clone()));
        }
        if let Some(value) = &self.cross_origin_resource_policy {
            set.push(("Cross-Origin-Resource-Policy".to_string(), value.clone()));
        }
        for (name, value) in &self.custom {
            set.push((name.clone(), value.clone()));
        }

        (set, self.remove.clone())
    }
}

/// Builder for [`SecurityHeaders`]. Each policy has a sane default and is
/// individually togglable.
pub struct SecurityHeadersBuilder {
    content_security_policy: Option<String>,
    hsts: Option<HstsConfig>,
    x_frame_options: Option<String>,
    x_content_type_options: bool,
    x_xss_protection: bool,
    referrer_policy: Option<String>,
    permissions_policy: Option<String>,
    cross_origin_opener_policy: Option<String>,
    cross_origin_embedder_policy: Option<String>,
    cross_origin_resource_policy: Option<String>,
    remove: Vec<String>,
    custom: HashMap<String, String>,
}

impl Default for SecurityHeadersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityHeadersBuilder {
    pub fn new() -> Self {
        Self {
            content_security_policy: Some("default-src 'self'".to_string()),
            hsts: Some(HstsConfig {
                max_age_secs: 15_552_000,
                include_subdomains: true,
                preload: false,
            }),
            x_frame_options: Some("DENY".to_string()),
            x_content_type_options: true,
            x_xss_protection: true,
            referrer_policy: Some("no-referrer".to_string()),
            permissions_policy: Some("geolocation=(), microphone=(), camera=()".to_string()),
            cross_origin_opener_policy: Some("same-origin".to_string()),
            cross_origin_embedder_policy: None,
            cross_origin_resource_policy: Some("same-origin".to_string()),
            remove: vec!["X-Powered-By".to_string()],
            custom: HashMap::new(),
        }
    }

    pub fn content_security_policy(mut self, value: Option<String>) -> Self {
        self.content_security_policy = value;
        self
    }

    pub fn hsts(mut self, config: Option<HstsConfig>) -> Self {
        self.hsts = config;
        self
    }

    pub fn x_frame_options(mut self, value: Option<String>) -> Self {
        self.x_frame_options = value;
        self
    }

    pub fn x_content_type_options(mut self, enabled: bool) -> Self {
        self.x_content_type_options = enabled;
        self
    }

    pub fn x_xss_protection(mut self, enabled: bool) -> Self {
        self.x_xss_protection = enabled;
        self
    }

    pub fn referrer_policy(mut self, value: Option<String>) -> Self {
        self.referrer_policy = value;
        self
    }

    pub fn permissions_policy(mut self, value: Option<String>) -> Self {
        self.permissions_policy = value;
        self
    }

    pub fn cross_origin_opener_policy(mut self, value: Option<String>) -> Self {
        self.cross_origin_opener_policy = value;
        self
    }

    pub fn cross_origin_embedder_policy(mut self, value: Option<String>) -> Self {
        self.cross_origin_embedder_policy = value;
        self
    }

    pub fn cross_origin_resource_policy(mut self, value: Option<String>) -> Self {
        self.cross_origin_resource_policy = value;
        self
    }

    /// Adds a header name to strip from the response (e.g. `X-Powered-By`).
    pub fn remove_header(mut self, name: impl Into<String>) -> Self {
        self.remove.push(name.into());
        self
    }

    /// Sets an arbitrary custom header.
    pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> SecurityHeaders {
        SecurityHeaders {
            content_security_policy: self.content_security_policy,
            hsts: self.hsts,
            x_frame_options: self.x_frame_options,
            x_content_type_options: self.x_content_type_options,
            x_xss_protection: self.x_xss_protection,
            referrer_policy: self.referrer_policy,
            permissions_policy: self.permissions_policy,
            cross_origin_opener_policy: self.cross_origin_opener_policy,
            cross_origin_embedder_policy: self.cross_origin_embedder_policy,
            cross_origin_resource_policy: self.cross_origin_resource_policy,
            remove: self.remove,
            custom: self.custom,
        }
    }
}

/// Determines whether a request should be treated as HTTPS: `req.secure` OR
/// `X-Forwarded-Proto: https`.
pub fn is_secure(req_secure: bool, forwarded_proto: Option<&str>) -> bool {
    req_secure || forwarded_proto.map(|p| p.eq_ignore_ascii_case("https")).unwrap_or(false)
}
