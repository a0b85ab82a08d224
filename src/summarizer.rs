use crate::document::DocumentModel;
use crate::extractor::MetadataExtractor;
use crate::fetcher::{Fetcher, FetcherConfig};
use crate::icon::select_icon;
use crate::oembed::resolve_player;
use crate::{Summary, SummaryError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Per-call knobs forwarded to the page fetch.
#[derive(Debug, Clone, Default)]
pub struct SummarizeOptions {
    /// BCP-47 tag sent as `Accept-Language`.
    pub lang: Option<String>,
    /// Overrides the client-level user agent for this run.
    pub user_agent: Option<String>,
}

/// Everything a strategy needs for one run: the page URL, the parsed
/// document, and the fetcher for secondary round trips.
pub struct SummarizeContext<'a> {
    pub url: &'a Url,
    pub doc: &'a DocumentModel,
    pub fetcher: &'a Fetcher,
    pub user_agent: Option<&'a str>,
}

/// An extraction strategy: a capability test plus the extraction itself.
///
/// Strategies are consulted in registration order; the first whose `test`
/// passes owns the run.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn test(&self, url: &Url) -> bool;
    async fn summarize(&self, ctx: &SummarizeContext<'_>) -> Result<Summary, SummaryError>;
}

/// The general-purpose strategy: OGP/Twitter/HTML heuristics, icon
/// selection, and oEmbed player resolution. Accepts every URL.
#[derive(Clone, Default)]
pub struct GeneralSummarizer {
    extractor: MetadataExtractor,
}

impl GeneralSummarizer {
    pub fn new() -> Self {
        Self {
            extractor: MetadataExtractor::new(),
        }
    }
}

#[async_trait]
impl Summarizer for GeneralSummarizer {
    fn test(&self, _url: &Url) -> bool {
        true
    }

    async fn summarize(&self, ctx: &SummarizeContext<'_>) -> Result<Summary, SummaryError> {
        let metadata = self.extractor.extract(ctx.doc);
        let icon = select_icon(ctx.doc, ctx.fetcher).await.unwrap_or_default();
        let player = resolve_player(ctx.doc, ctx.fetcher, &metadata, ctx.user_agent).await;

        Ok(Summary {
            title: metadata.title,
            icon,
            description: metadata.description,
            thumbnail: metadata.thumbnail,
            player,
            sitename: metadata.sitename,
            sensitive: metadata.sensitive,
            url: ctx.url.to_string(),
        })
    }
}

/// Entry point: fetches, decodes and parses a page, then hands it to the
/// first strategy that claims it.
#[derive(Clone)]
pub struct SummaryService {
    fetcher: Fetcher,
    strategies: Vec<Arc<dyn Summarizer>>,
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryService {
    pub fn new() -> Self {
        Self::with_fetcher(Fetcher::new())
    }

    pub fn with_config(config: FetcherConfig) -> Self {
        Self::with_fetcher(Fetcher::with_config(config))
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            strategies: vec![Arc::new(GeneralSummarizer::new())],
        }
    }

    /// Prepend a strategy; it is consulted before the existing ones.
    pub fn register(&mut self, strategy: Arc<dyn Summarizer>) {
        self.strategies.insert(0, strategy);
    }

    pub async fn summarize(&self, url: &str) -> Result<Summary, SummaryError> {
        self.summarize_with_options(url, &SummarizeOptions::default())
            .await
    }

    pub async fn summarize_with_options(
        &self,
        url: &str,
        options: &SummarizeOptions,
    ) -> Result<Summary, SummaryError> {
        let result = self.run(url, options).await;
        if let Err(e) = &result {
            e.log();
        }
        result
    }

    #[instrument(level = "debug", skip(self, options))]
    async fn run(
        &self,
        url: &str,
        options: &SummarizeOptions,
    ) -> Result<Summary, SummaryError> {
        let url = Url::parse(url)?;

        let body = self
            .fetcher
            .fetch_page(
                &url,
                options.lang.as_deref(),
                options.user_agent.as_deref(),
            )
            .await?;
        let doc = DocumentModel::parse(&body, url.clone());

        let ctx = SummarizeContext {
            url: &url,
            doc: &doc,
            fetcher: &self.fetcher,
            user_agent: options.user_agent.as_deref(),
        };

        for strategy in &self.strategies {
            if strategy.test(&url) {
                debug!(url = %url, "Strategy accepted URL");
                return strategy.summarize(&ctx).await;
            }
        }

        Err(SummaryError::NoSummarizer)
    }
}
