//! Media references with local placeholder fallback.
//!
//! Every illustration and avatar lives at a fixed external URL. When it
//! cannot be loaded the client swaps in `/placeholder.svg` annotated with a
//! short emoji tag. Each image falls back on its own; a failed image never
//! fails the screen around it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Local placeholder served next to the web client.
pub const PLACEHOLDER_PATH: &str = "/placeholder.svg";

/// Absolute form of [`PLACEHOLDER_PATH`], only used to build the query.
const PLACEHOLDER_BASE: &str = "http://localhost/placeholder.svg";

/// A static reference to an external image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub url: &'static str,
    pub alt: &'static str,
    /// Emoji or short text shown on the placeholder.
    pub fallback_tag: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    pub const fn new(
        url: &'static str,
        alt: &'static str,
        fallback_tag: &'static str,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            url,
            alt,
            fallback_tag,
            width,
            height,
        }
    }

    /// Placeholder URL used when the primary source fails to load.
    pub fn placeholder_url(&self) -> String {
        let params = [
            ("height", self.height.to_string()),
            ("width", self.width.to_string()),
            ("text", self.fallback_tag.to_string()),
        ];
        match reqwest::Url::parse_with_params(PLACEHOLDER_BASE, &params) {
            Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
            Err(e) => {
                warn!(error = %e, "Could not build placeholder URL");
                PLACEHOLDER_PATH.to_string()
            }
        }
    }

    /// Render-ready view. An empty URL goes straight to the bare placeholder.
    pub fn view(&self) -> ImageView {
        let src = if self.url.is_empty() {
            PLACEHOLDER_PATH.to_string()
        } else {
            self.url.to_string()
        };
        ImageView {
            src,
            fallback_src: self.placeholder_url(),
            alt: self.alt.to_string(),
            width: self.width,
            height: self.height,
            substituted: false,
        }
    }
}

/// Image as handed to a renderer: primary source plus its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub src: String,
    pub fallback_src: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
    /// True when `src` was already swapped for the fallback.
    pub substituted: bool,
}

impl ImageView {
    /// Swap the primary source for the placeholder.
    pub fn use_fallback(&mut self) {
        if !self.substituted {
            self.src = self.fallback_src.clone();
            self.substituted = true;
        }
    }
}

/// Checks whether an external image can be loaded.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Probe that issues a `HEAD` request. Only definitive answers are cached:
/// timeouts, server errors and hosts that refuse `HEAD` are asked again.
pub struct HttpMediaProbe {
    client: reqwest::Client,
    cache: RwLock<HashMap<String, bool>>,
}

impl HttpMediaProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for media probe");
                reqwest::Client::new()
            });
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MediaProbe for HttpMediaProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        if let Some(known) = self.cache.read().await.get(url) {
            return *known;
        }

        match self.client.head(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                match head_verdict(status) {
                    Some(reachable) => {
                        self.cache.write().await.insert(url.to_string(), reachable);
                        reachable
                    }
                    // No cacheable verdict; let the browser try the image itself.
                    None => {
                        debug!(url, %status, "Image probe inconclusive");
                        !status.is_server_error()
                    }
                }
            }
            Err(e) => {
                debug!(url, error = %e, "Image probe failed");
                false
            }
        }
    }
}

/// Cacheable answer for a `HEAD` status, if the status is conclusive.
fn head_verdict(status: StatusCode) -> Option<bool> {
    if status.is_success() {
        Some(true)
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Some(false)
    } else {
        None
    }
}

/// Substitutes placeholders for images the probe cannot reach.
#[derive(Clone)]
pub struct MediaResolver {
    probe: Arc<dyn MediaProbe>,
}

impl MediaResolver {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe }
    }

    /// Resolve each image independently, probing all of them at once.
    /// Returns how many fell back.
    pub async fn resolve_all(&self, images: Vec<&mut ImageView>) -> usize {
        let pending: Vec<&mut ImageView> = images
            .into_iter()
            .filter(|image| !image.substituted && image.src != PLACEHOLDER_PATH)
            .collect();

        let verdicts = join_all(pending.iter().map(|image| self.probe.is_reachable(&image.src))).await;

        let mut substituted = 0;
        for (image, reachable) in pending.into_iter().zip(verdicts) {
            if !reachable {
                image.use_fallback();
                substituted += 1;
            }
        }
        substituted
    }
}
