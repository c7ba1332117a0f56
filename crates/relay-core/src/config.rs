//! Dispatch configuration, deserializable from TOML.
//!
//! routing class ごとの設定（project / location / queue / service account / url base）と、
//! プロセス共通のデフォルトを 1 つのオブジェクトにまとめ、submitter に `Arc` で渡します。
//! 未設定のフィールドはフィールド単位で `[defaults]` にフォールバックします。

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::{AuthPrincipal, QueueLocator, RoutingClass};
use crate::ports::ValidationMode;

/// Default dedup retention past the end of a bucket.
pub const DEFAULT_DEDUP_RETENTION_MS: i64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub defaults: RouteConfig,
    pub routes: HashMap<String, RouteOverrides>,
    pub validation_mode: ValidationMode,
    pub dedup: DedupConfig,
}

/// Destination settings used when a routing class has no override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub project: String,
    pub location: String,
    pub queue: String,
    pub service_account_email: String,
    /// Joined in front of relative call URLs.
    pub url_base: Option<String>,
}

/// Per routing class overrides; `None` falls back to `[defaults]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteOverrides {
    pub project: Option<String>,
    pub location: Option<String>,
    pub queue: Option<String>,
    pub service_account_email: Option<String>,
    pub url_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// How long a reservation outlives the end of its bucket.
    pub retention_ms: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            retention_ms: DEFAULT_DEDUP_RETENTION_MS,
        }
    }
}

/// Fully resolved destination for one routing class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub locator: QueueLocator,
    pub auth: AuthPrincipal,
    pub url_base: Option<String>,
}

impl ResolvedRoute {
    /// Resolve `url` against `url_base` as a URL reference (RFC 3986).
    ///
    /// A base with a path keeps that path only for references without a
    /// leading `/`. Without a base, `url` must already be absolute.
    pub fn absolute_url(&self, url: &str) -> Result<String, url::ParseError> {
        let resolved = match self.url_base.as_deref().filter(|b| !b.is_empty()) {
            Some(base) => Url::parse(base)?.join(url)?,
            None => Url::parse(url)?,
        };
        Ok(resolved.into())
    }
}

impl DispatchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn set_defaults(&mut self, defaults: RouteConfig) {
        self.defaults = defaults;
    }

    pub fn set_route(&mut self, routing_class: impl Into<String>, overrides: RouteOverrides) {
        self.routes.insert(routing_class.into(), overrides);
    }

    /// Remove an override so the class falls back to the defaults again.
    pub fn clear_route(&mut self, routing_class: &str) {
        self.routes.remove(routing_class);
    }

    pub fn with_route(mut self, routing_class: impl Into<String>, overrides: RouteOverrides) -> Self {
        self.set_route(routing_class, overrides);
        self
    }

    pub fn resolve(&self, routing_class: &RoutingClass) -> ResolvedRoute {
        let d = &self.defaults;
        let o = self.routes.get(routing_class.as_str());

        ResolvedRoute {
            locator: QueueLocator::new(
                pick(o, |o| o.project.as_ref(), &d.project),
                pick(o, |o| o.location.as_ref(), &d.location),
                pick(o, |o| o.queue.as_ref(), &d.queue),
            ),
            auth: AuthPrincipal {
                service_account_email: pick(
                    o,
                    |o| o.service_account_email.as_ref(),
                    &d.service_account_email,
                ),
            },
            url_base: o
                .and_then(|o| o.url_base.clone())
                .or_else(|| d.url_base.clone()),
        }
    }
}

fn pick(
    overrides: Option<&RouteOverrides>,
    field: impl Fn(&RouteOverrides) -> Option<&String>,
    default: &str,
) -> String {
    overrides
        .and_then(field)
        .map_or_else(|| default.to_string(), String::clone)
}
