//! Resolver configuration

use crate::syntax::Syntax;
use std::env;
use std::time::Duration;

/// Default timeout for URL sources
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the source resolver's network fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Total time allowed for one GET, including reading the body
    pub fetch_timeout: Duration,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
    /// `Accept` header sent with every request
    pub accept: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: default_user_agent(),
            accept: default_accept(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `SFLO_FETCH_TIMEOUT_SECS` and `SFLO_USER_AGENT`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var("SFLO_FETCH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.fetch_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid SFLO_FETCH_TIMEOUT_SECS"),
            }
        }
        if let Ok(agent) = env::var("SFLO_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }
        config
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

fn default_user_agent() -> String {
    format!("sflo-rdf/{}", env!("CARGO_PKG_VERSION"))
}

/// Every supported media type, jsonld preferred
fn default_accept() -> String {
    Syntax::ALL
        .iter()
        .enumerate()
        .map(|(i, syntax)| match i {
            0 => syntax.content_type().to_string(),
            _ => format!("{};q=0.9", syntax.content_type()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
