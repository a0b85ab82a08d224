use crate::encoding::{decode_text, media_type};
use crate::security::{ensure_public_host, ScreeningResolver};
use crate::SummaryError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "LinkSummaryBot/0.1.0";

/// Media types accepted for the primary page fetch.
pub const PAGE_ALLOW_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];
/// Media types accepted for the oEmbed discovery fetch.
pub const JSON_ALLOW_TYPES: &[&str] = &["application/json"];

pub const PAGE_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MiB
pub const OEMBED_BODY_LIMIT: usize = 500 * 1024; // 500 KiB

const PAGE_ACCEPT: &str = "text/html, application/xhtml+xml";
const JSON_ACCEPT: &str = "application/json";

const MAX_REDIRECTS: usize = 10;

/// Client-level fetch configuration, resolved by the caller.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Disables all address filtering. Test mode only.
    pub allow_private: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            allow_private: false,
        }
    }
}

/// One outbound request: the URL plus everything that scopes the fetch.
///
/// Immutable once handed to [`Fetcher::fetch`]; owned by a single pipeline
/// run.
#[derive(Debug, Clone)]
pub struct FetchTarget<'a> {
    url: &'a Url,
    accept: &'static str,
    allow_types: &'static [&'static str],
    limit: usize,
    user_agent: Option<&'a str>,
    accept_language: Option<&'a str>,
}

impl<'a> FetchTarget<'a> {
    /// Target scoped to HTML-class media types at the 10 MiB ceiling.
    pub fn page(url: &'a Url) -> Self {
        Self {
            url,
            accept: PAGE_ACCEPT,
            allow_types: PAGE_ALLOW_TYPES,
            limit: PAGE_BODY_LIMIT,
            user_agent: None,
            accept_language: None,
        }
    }

    /// Target scoped to JSON at the 500 KiB ceiling.
    pub fn oembed(url: &'a Url) -> Self {
        Self {
            url,
            accept: JSON_ACCEPT,
            allow_types: JSON_ALLOW_TYPES,
            limit: OEMBED_BODY_LIMIT,
            user_agent: None,
            accept_language: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<&'a str>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_accept_language(mut self, lang: Option<&'a str>) -> Self {
        self.accept_language = lang;
        self
    }
}

/// Raw bytes plus the media type the server declared for them.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: Vec<u8>,
    pub media_type: String,
    pub content_type: String,
}

impl FetchResult {
    /// Decode the body through charset sniffing.
    pub fn text(&self) -> String {
        decode_text(&self.body, Some(&self.content_type))
    }
}

/// HTTP fetcher that refuses to talk to non-public address space.
///
/// Cheap to clone; the inner client is safe for concurrent reuse across
/// independent summarization runs.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    user_agent: String,
    allow_private: bool,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Self {
        // Redirects are followed by hand in get_screened so every hop's host
        // is screened before its connection is opened.
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(10);
        if !config.allow_private {
            builder = builder.dns_resolver(Arc::new(ScreeningResolver));
        }
        let client = builder
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to create HTTP client");
                panic!("Failed to initialize HTTP client: {}", e);
            });
        debug!(
            user_agent = %config.user_agent,
            allow_private = config.allow_private,
            "Fetcher initialized"
        );
        Self {
            client,
            user_agent: config.user_agent,
            allow_private: config.allow_private,
        }
    }

    /// Perform one capped, type-checked fetch.
    ///
    /// Every redirect hop's host is screened before its connection is
    /// opened. The body is truncated at the target's byte ceiling rather
    /// than erroring.
    #[instrument(level = "debug", skip(self, target), fields(url = %target.url), err)]
    pub async fn fetch(&self, target: &FetchTarget<'_>) -> Result<FetchResult, SummaryError> {
        let mut response = self
            .get_screened(
                target.url,
                target.accept,
                target.user_agent,
                target.accept_language,
            )
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let mediatype = media_type(&content_type);
        if !target.allow_types.contains(&mediatype.as_str()) {
            warn!(media_type = %mediatype, "Rejected by content type");
            return Err(SummaryError::InvalidContentType(mediatype));
        }

        let mut body: Vec<u8> = Vec::new();
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) if e.is_timeout() => {
                    return Err(SummaryError::TimeoutError(e.to_string()))
                }
                Err(e) => return Err(SummaryError::FetchError(e.to_string())),
            };
            let remaining = target.limit - body.len();
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!(limit = target.limit, "Body truncated at byte ceiling");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), media_type = %mediatype, "Fetch complete");
        Ok(FetchResult {
            body,
            media_type: mediatype,
            content_type,
        })
    }

    /// Issue a GET, following redirects by hand. Every hop's host is screened
    /// before its connection is opened, so a public page cannot bounce the
    /// request into blocked address space via `Location`.
    async fn get_screened(
        &self,
        url: &Url,
        accept: &str,
        user_agent: Option<&str>,
        accept_language: Option<&str>,
    ) -> Result<reqwest::Response, SummaryError> {
        let mut url = url.clone();
        for _ in 0..MAX_REDIRECTS {
            ensure_public_host(&url, self.allow_private).await?;

            let mut request = self
                .client
                .get(url.clone())
                .header(USER_AGENT, user_agent.unwrap_or(&self.user_agent))
                .header(ACCEPT, accept);
            if let Some(lang) = accept_language {
                request = request.header(ACCEPT_LANGUAGE, lang);
            }
            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    SummaryError::TimeoutError(e.to_string())
                } else {
                    SummaryError::FetchError(e.to_string())
                }
            })?;

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    SummaryError::FetchError("redirect without a Location header".to_string())
                })?;
            url = url.join(location)?;
            debug!(url = %url, "Following redirect");
        }
        Err(SummaryError::FetchError(format!(
            "stopped after {MAX_REDIRECTS} redirect hops"
        )))
    }

    /// True when the URL is routable and the server answers with a success
    /// status. Used to confirm well-known paths; the body is discarded.
    pub async fn probe_ok(&self, url: &Url) -> bool {
        match self.get_screened(url, "*/*", None, None).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Fetch an HTML page and decode it to text.
    pub async fn fetch_page(
        &self,
        url: &Url,
        lang: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String, SummaryError> {
        let target = FetchTarget::page(url)
            .with_accept_language(lang)
            .with_user_agent(user_agent);
        let result = self.fetch(&target).await?;
        Ok(result.text())
    }

    /// Fetch and deserialize a JSON document, scoped to the oEmbed limits.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        user_agent: Option<&str>,
    ) -> Result<T, SummaryError> {
        let target = FetchTarget::oembed(url).with_user_agent(user_agent);
        let result = self.fetch(&target).await?;
        serde_json::from_slice(&result.body)
            .map_err(|e| SummaryError::ExtractError(format!("invalid JSON body: {e}")))
    }
}
