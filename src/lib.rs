mod document;
mod encoding;
mod error;
mod extractor;
mod fetcher;
mod icon;
mod logging;
mod oembed;
mod security;
mod summarizer;
mod utils;

pub use document::DocumentModel;
pub use encoding::decode_text;
pub use error::SummaryError;
pub use extractor::{MetadataExtractor, OgVideo, PageMetadata, TwitterPlayer};
pub use fetcher::{
    FetchResult, FetchTarget, Fetcher, FetcherConfig, DEFAULT_USER_AGENT, OEMBED_BODY_LIMIT,
    PAGE_BODY_LIMIT,
};
pub use icon::{discover_icons, select_best, select_icon, IconCandidate};
pub use logging::{setup_logging, LogConfig};
pub use oembed::{
    validate_oembed, OembedDocument, SAFE_PERMISSIONS, TYPE_LINK, TYPE_PHOTO, TYPE_RICH,
    TYPE_VIDEO,
};
pub use summarizer::{
    GeneralSummarizer, SummarizeContext, SummarizeOptions, Summarizer, SummaryService,
};

/// A player dimension as it appeared in the source document.
///
/// oEmbed providers emit both `500` and `500.0`; consumers distinguish the
/// two, so the numeric subtype is preserved through serialization.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Int(i64),
    Float(f64),
}

/// Descriptor for an embeddable player iframe.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Player {
    pub url: String,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub allow: Vec<String>,
}

/// The normalized link preview produced by one summarization run.
///
/// Every URL-valued field is absolute; fields the page did not provide are
/// empty strings (or `None` for the player).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    pub title: String,
    pub icon: String,
    pub description: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
    pub sitename: String,
    pub sensitive: bool,
    pub url: String,
}
