//! Source resolution: the only place that performs I/O
//!
//! A [`SourceDescriptor`] becomes raw content plus the base IRI every
//! relative reference in it will be resolved against:
//!
//! - files: the `file://` URL of the lexically absolutized path
//! - URLs: the URL exactly as given
//! - inline documents: a fresh `file:///virtual/inline-<millis>-<n>` IRI

use crate::config::ResolverConfig;
use crate::error::SourceFailure;
use crate::syntax::{detect_syntax, Syntax};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};
use url::Url;

/// Where an RDF document comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceDescriptor {
    /// A document held in memory.
    ///
    /// `jsonld` is either a structured JSON-LD document or a string holding
    /// one. A string payload with a stream `syntax` is parsed as that syntax.
    Inline {
        #[serde(default)]
        syntax: Syntax,
        jsonld: JsonValue,
    },
    /// A local file
    File {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        syntax: Option<Syntax>,
    },
    /// A remote document fetched with HTTP GET
    Url {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        syntax: Option<Syntax>,
    },
}

impl SourceDescriptor {
    pub fn inline(document: JsonValue) -> Self {
        SourceDescriptor::Inline {
            syntax: Syntax::Jsonld,
            jsonld: document,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::File {
            path: path.into(),
            syntax: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        SourceDescriptor::Url {
            url: url.into(),
            syntax: None,
        }
    }

    /// Override syntax detection for file and URL sources.
    pub fn with_syntax(self, syntax: Syntax) -> Self {
        match self {
            SourceDescriptor::Inline { jsonld, .. } => SourceDescriptor::Inline { syntax, jsonld },
            SourceDescriptor::File { path, .. } => SourceDescriptor::File {
                path,
                syntax: Some(syntax),
            },
            SourceDescriptor::Url { url, .. } => SourceDescriptor::Url {
                url,
                syntax: Some(syntax),
            },
        }
    }
}

/// Raw content of a resolved source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    Text(String),
    Document(JsonValue),
}

/// Content plus the base IRI and syntax it must be parsed with
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub content: SourceContent,
    pub base_iri: String,
    pub syntax: Syntax,
}

/// Resolve a source descriptor.
///
/// `cancel` aborts an in-flight URL fetch; it has no effect on other kinds.
pub async fn resolve(
    descriptor: &SourceDescriptor,
    config: &ResolverConfig,
    cancel: Option<&CancellationToken>,
) -> Result<ResolvedSource, SourceFailure> {
    match descriptor {
        SourceDescriptor::Inline { syntax, jsonld } => Ok(resolve_inline(*syntax, jsonld)),
        SourceDescriptor::File { path, syntax } => {
            let span = tracing::debug_span!("resolve_file", path = %path.display());
            resolve_file(path, *syntax).instrument(span).await
        }
        SourceDescriptor::Url { url, syntax } => {
            let span = tracing::debug_span!("resolve_url", url = %url);
            resolve_url(url, *syntax, config, cancel).instrument(span).await
        }
    }
}

// ---------------------------------------------------------------------------
// Inline
// ---------------------------------------------------------------------------

static INLINE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A synthetic base that no other inline source in this process shares.
pub fn inline_base_iri() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let n = INLINE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("file:///virtual/inline-{millis}-{n}")
}

fn resolve_inline(syntax: Syntax, document: &JsonValue) -> ResolvedSource {
    let base_iri = inline_base_iri();
    debug!(base = %base_iri, %syntax, "resolved inline source");
    let content = match document {
        JsonValue::String(text) => SourceContent::Text(text.clone()),
        other => SourceContent::Document(other.clone()),
    };
    ResolvedSource {
        content,
        base_iri,
        syntax,
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

async fn resolve_file(path: &Path, hint: Option<Syntax>) -> Result<ResolvedSource, SourceFailure> {
    let read_error = |source: std::io::Error| SourceFailure::Read {
        path: path.to_path_buf(),
        source,
    };

    let absolute = absolutize(path).map_err(read_error)?;
    let base_iri = Url::from_file_path(&absolute)
        .map_err(|()| {
            read_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path cannot be expressed as a file URL",
            ))
        })?
        .to_string();

    let text = tokio::fs::read_to_string(&absolute).await.map_err(read_error)?;
    let syntax = detect_syntax(hint, absolute.to_str(), None);
    debug!(base = %base_iri, %syntax, bytes = text.len(), "read file source");

    Ok(ResolvedSource {
        content: SourceContent::Text(text),
        base_iri,
        syntax,
    })
}

/// Join a relative path to the current directory and drop `.`/`..`
/// segments without touching the filesystem.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// URL
// ---------------------------------------------------------------------------

async fn resolve_url(
    url: &str,
    hint: Option<Syntax>,
    config: &ResolverConfig,
    cancel: Option<&CancellationToken>,
) -> Result<ResolvedSource, SourceFailure> {
    let fetch = fetch(url, config);
    let (text, content_type) = match cancel {
        Some(token) => tokio::select! {
            result = fetch => result?,
            () = token.cancelled() => {
                debug!("fetch cancelled");
                return Err(fetch_error(url, None, "request cancelled"));
            }
        },
        None => fetch.await?,
    };

    let syntax = detect_syntax(hint, Some(url), content_type.as_deref());
    debug!(%syntax, bytes = text.len(), "fetched URL source");

    Ok(ResolvedSource {
        content: SourceContent::Text(text),
        base_iri: url.to_string(),
        syntax,
    })
}

/// GET `url`, returning the body and its `Content-Type`.
async fn fetch(url: &str, config: &ResolverConfig) -> Result<(String, Option<String>), SourceFailure> {
    let client = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| fetch_error(url, None, e.to_string()))?;

    let response = client
        .get(url)
        .header(ACCEPT, &config.accept)
        .send()
        .await
        .map_err(|e| transport_error(url, e, config))?;

    let status = response.status();
    if !status.is_success() {
        warn!(url, status = status.as_u16(), "fetch returned non-success status");
        return Err(fetch_error(url, Some(status.as_u16()), status.to_string()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if content_type.is_none() {
        warn!(url, "response has no content type");
    }

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(url, e, config))?;
    Ok((text, content_type))
}

fn transport_error(url: &str, err: reqwest::Error, config: &ResolverConfig) -> SourceFailure {
    if err.is_timeout() {
        fetch_error(
            url,
            None,
            format!("timed out after {}ms", config.fetch_timeout.as_millis()),
        )
    } else {
        fetch_error(url, None, err.to_string())
    }
}

fn fetch_error(url: &str, status: Option<u16>, reason: impl Into<String>) -> SourceFailure {
    SourceFailure::Fetch {
        url: url.to_string(),
        status,
        reason: reason.into(),
    }
}
