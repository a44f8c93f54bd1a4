use thiserror::Error;

/// Construction-time errors for the IP filter. Individual bad rule entries
/// are skipped with a warning rather than raised here; this error is reserved
/// for configuration that cannot be made sense of at all (e.g. an empty
/// ruleset in `Whitelist` mode, which would reject every request).
#[derive(Debug, Error)]
pub enum IpFilterError {
    #[error("whitelist mode configured with no allow rules; every request would be rejected")]
    EmptyWhitelist,
}
