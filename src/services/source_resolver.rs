// src/services/source_resolver.rs
//
// Source Resolver
//
// Builds the proxy-routed playlist URI from raw upstream data.
// Pure: no state, no I/O. "Unresolvable" is a normal answer while the
// upstream data is still loading.

use std::collections::HashMap;

use log::debug;

use crate::domain::{EpisodeSource, PlaybackSource, SourceEntry};

const PROXY_PATH: &str = "/m3u8-proxy";
const REFERER_HEADER: &str = "Referer";

#[derive(Debug, Clone)]
pub struct SourceResolver {
    proxy_base: String,
}

impl SourceResolver {
    pub fn new(proxy_base: impl Into<String>) -> Self {
        Self {
            proxy_base: proxy_base.into(),
        }
    }

    pub fn proxy_base(&self) -> &str {
        &self.proxy_base
    }

    /// Resolve the first source through the proxy.
    ///
    /// Returns `None` when there is no source or no `Referer` header.
    pub fn resolve(
        &self,
        sources: &[SourceEntry],
        headers: &HashMap<String, String>,
    ) -> Option<PlaybackSource> {
        let primary = sources.first().map(|entry| entry.url.as_str()).filter(|url| !url.is_empty());
        let referer = referer_header(headers).filter(|referer| !referer.is_empty());

        let (Some(primary_url), Some(referer)) = (primary, referer) else {
            debug!(
                "source unresolvable (sources: {}, referer present: {})",
                sources.len(),
                referer.is_some()
            );
            return None;
        };

        let resolved_uri = format!(
            "{}{}?url={}&referer={}",
            self.proxy_base,
            PROXY_PATH,
            encode_uri_component(primary_url),
            referer
        );

        Some(PlaybackSource {
            primary_url: primary_url.to_string(),
            referer: referer.to_string(),
            resolved_uri,
        })
    }

    pub fn resolve_episode(&self, episode: &EpisodeSource) -> Option<PlaybackSource> {
        self.resolve(&episode.sources, &episode.headers)
    }
}

/// Exact `Referer` key first, then any casing of it
fn referer_header(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .get(REFERER_HEADER)
        .or_else(|| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(REFERER_HEADER))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

/// Percent-encode like ECMAScript `encodeURIComponent`.
///
/// `urlencoding` escapes everything outside `A-Za-z0-9-_.~`; the proxy
/// expects `! * ' ( )` to stay literal.
pub fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}
