//! Miscellaneous helpers.

use crate::errors::{DeploymentFailure, FailureKind};
use regex::Regex;
use std::sync::LazyLock;
use tracing_subscriber::{EnvFilter, prelude::*};
use url::Url;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`()\[\]]+"#).unwrap());

/// Initializes a tracing subscriber for logging, filtered by `RUST_LOG`.
pub fn subscriber() {
    let _ = tracing_subscriber::Registry::default()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn env_filter() -> EnvFilter {
    const DEFAULT_DIRECTIVES: &[&str] = &["hyper=off", "hyper_util=off", "reqwest=off", "h2=off"];
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Returns the first `http(s)` URL found in free-form text, such as an issue body.
pub fn extract_rpc_url(text: &str) -> Option<&str> {
    URL_RE.find(text).map(|m| m.as_str().trim_end_matches(['.', ',', ';']))
}

/// Parses an RPC URL, mapping any failure to [`FailureKind::RpcUrlNotFound`].
pub fn parse_rpc_url(url: &str) -> Result<Url, DeploymentFailure> {
    let url = url.trim();
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed),
        _ => Err(DeploymentFailure::new(FailureKind::RpcUrlNotFound).with("url", url)),
    }
}

/// Resolves the RPC URL from an explicit value, falling back to the first URL in `issue_body`.
pub fn resolve_rpc_url(
    rpc: Option<&str>,
    issue_body: Option<&str>,
) -> Result<Url, DeploymentFailure> {
    let candidate = rpc
        .filter(|rpc| !rpc.trim().is_empty())
        .or_else(|| issue_body.and_then(extract_rpc_url))
        .ok_or_else(|| DeploymentFailure::new(FailureKind::RpcUrlNotFound))?;
    parse_rpc_url(candidate)
}
