//! Dial target parsing.
//!
//! Targets take the form `polaris://<service>/`, optionally carrying a
//! `?namespace=<ns>` query that overrides the client namespace.

use thiserror::Error;
use url::Url;

/// URI scheme accepted by the mesh dialer.
pub const SCHEME: &str = "polaris";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("malformed target: {0}")]
    Malformed(String),

    #[error("unsupported scheme {0:?}, expected \"polaris\"")]
    UnsupportedScheme(String),

    #[error("target has no service name")]
    MissingService,

    #[error("unexpected path {0:?} after service name")]
    UnexpectedPath(String),
}

/// A parsed mesh target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Service name to resolve.
    pub service: String,
    /// Namespace override carried in the target, if any.
    pub namespace: Option<String>,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let url = Url::parse(raw).map_err(|e| TargetError::Malformed(e.to_string()))?;

        if url.scheme() != SCHEME {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }

        let service = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(TargetError::MissingService),
        };

        let path = url.path();
        if !path.is_empty() && path != "/" {
            return Err(TargetError::UnexpectedPath(path.to_string()));
        }

        let namespace = url
            .query_pairs()
            .find(|(k, _)| k == "namespace")
            .map(|(_, v)| v.into_owned())
            .filter(|ns| !ns.is_empty());

        Ok(Self { service, namespace })
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/", SCHEME, self.service)?;
        if let Some(ns) = &self.namespace {
            write!(f, "?namespace={}", ns)?;
        }
        Ok(())
    }
}
