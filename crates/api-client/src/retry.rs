use configuration::EndpointConfig;
use std::fmt;
use url::form_urlencoded;

/// One way of reaching the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Request the registry URL as-is.
    Direct,
    /// Request `prefix` followed by the percent-encoded registry URL.
    Proxy { prefix: String },
}

impl Endpoint {
    /// The URL to request in order to fetch `target` through this endpoint.
    pub fn resolve(&self, target: &str) -> String {
        match self {
            Endpoint::Direct => target.to_string(),
            Endpoint::Proxy { prefix } => {
                let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
                format!("{prefix}{encoded}")
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Direct => f.write_str("direct"),
            Endpoint::Proxy { prefix } => write!(f, "proxy {prefix}"),
        }
    }
}

impl From<&EndpointConfig> for Endpoint {
    fn from(config: &EndpointConfig) -> Self {
        match config {
            EndpointConfig::Direct => Endpoint::Direct,
            EndpointConfig::Proxy { prefix } => Endpoint::Proxy {
                prefix: prefix.clone(),
            },
        }
    }
}

/// The ordered endpoints a single request walks through until one succeeds.
///
/// A policy is plain configuration. It holds no cursor, so every request starts
/// again from the first endpoint regardless of how earlier requests went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    endpoints: Vec<Endpoint>,
}

impl RetryPolicy {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// A policy with a single direct endpoint and no fallback.
    pub fn direct() -> Self {
        Self::new(vec![Endpoint::Direct])
    }

    pub fn from_config(endpoints: &[EndpointConfig]) -> Self {
        Self::new(endpoints.iter().map(Endpoint::from).collect())
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::direct()
    }
}
