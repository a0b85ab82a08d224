use crate::document::DocumentModel;
use crate::utils::{cleanup_title, clip, unescape_entities};
use tracing::debug;

const TITLE_LIMIT: usize = 100;
const DESCRIPTION_LIMIT: usize = 300;

/// Generic `rating` meta values that mark a page as adult content.
const ADULT_RATING_VALUES: &[&str] = &["adult", "RTA-5042-1996-1400-1577-RTA"];

/// An OGP video entry assembled from the structured `og:video:*` properties.
#[derive(Debug, Clone, Default)]
pub struct OgVideo {
    pub url: Option<String>,
    pub secure_url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Twitter Card player signals, kept raw for the fallback path.
#[derive(Debug, Clone, Default)]
pub struct TwitterPlayer {
    pub url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Resolved page metadata, before icon selection and player resolution.
#[derive(Debug, Clone)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub sitename: String,
    pub sensitive: bool,
    pub twitter_player: TwitterPlayer,
    pub og_videos: Vec<OgVideo>,
}

/// Walks the document model once and resolves each output field through its
/// fixed priority order.
#[derive(Clone, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, doc: &DocumentModel) -> PageMetadata {
        let title_raw = doc
            .meta_property("og:title")
            .or_else(|| doc.meta_any("twitter:title"))
            .or_else(|| doc.title_text())
            .unwrap_or_default();
        let mut title = clip(&unescape_entities(title_raw), TITLE_LIMIT);

        let description_raw = doc
            .meta_property("og:description")
            .or_else(|| doc.meta_any("twitter:description"))
            .or_else(|| doc.meta_name("description"))
            .unwrap_or_default();
        let mut description = clip(&unescape_entities(description_raw), DESCRIPTION_LIMIT);
        if description == title {
            description = String::new();
        }

        let thumbnail_raw = doc
            .meta_property("og:image")
            .or_else(|| doc.meta_property("og:image:url"))
            .or_else(|| doc.meta_property("og:image:secure_url"))
            .or_else(|| doc.meta_any("twitter:image"))
            .or_else(|| doc.link_href_by_rel("image_src"))
            .or_else(|| doc.link_href_by_rel("apple-touch-icon"))
            .or_else(|| doc.link_href_by_rel("apple-touch-icon image_src"))
            .unwrap_or_default();
        // A thumbnail that will not resolve is dropped, not an error.
        let thumbnail = if thumbnail_raw.is_empty() {
            String::new()
        } else {
            doc.resolve(thumbnail_raw).unwrap_or_default()
        };

        let sitename_raw = doc
            .meta_property("og:site_name")
            .or_else(|| doc.meta_name("application-name"))
            .map(str::to_string)
            .unwrap_or_else(|| doc.host());
        let sitename = unescape_entities(sitename_raw.trim());

        title = cleanup_title(&title, &sitename);
        if title.is_empty() {
            title = sitename.clone();
        }

        let sensitive = self.is_sensitive(doc);

        let metadata = PageMetadata {
            title,
            description,
            thumbnail,
            sitename,
            sensitive,
            twitter_player: self.twitter_player(doc),
            og_videos: self.og_videos(doc),
        };
        debug!(
            title = %metadata.title,
            sitename = %metadata.sitename,
            sensitive = metadata.sensitive,
            "Metadata extracted"
        );
        metadata
    }

    fn is_sensitive(&self, doc: &DocumentModel) -> bool {
        if doc.meta_any("mixi:content-rating") == Some("1") {
            return true;
        }
        doc.meta_name("rating")
            .map(|v| ADULT_RATING_VALUES.contains(&v.trim()))
            .unwrap_or(false)
    }

    fn twitter_player(&self, doc: &DocumentModel) -> TwitterPlayer {
        // The player URL is only honored when the card asks for a player.
        let card = doc.meta_any("twitter:card").unwrap_or_default();
        let url = if card != "summary_large_image" {
            doc.meta_any("twitter:player").map(str::to_string)
        } else {
            None
        };

        TwitterPlayer {
            url,
            width: doc
                .meta_any("twitter:player:width")
                .and_then(|v| v.trim().parse().ok()),
            height: doc
                .meta_any("twitter:player:height")
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Assemble `og:video` structured properties in document order: each
    /// `og:video`/`og:video:url` starts a new entry, the other suffixed
    /// properties attach to the most recent one.
    fn og_videos(&self, doc: &DocumentModel) -> Vec<OgVideo> {
        let mut videos: Vec<OgVideo> = Vec::new();
        for meta in doc.metas() {
            if meta.content.is_empty() {
                continue;
            }
            match meta.name.as_str() {
                "og:video" | "og:video:url" => videos.push(OgVideo {
                    url: Some(meta.content.clone()),
                    ..Default::default()
                }),
                "og:video:secure_url" => match videos.last_mut() {
                    Some(last) => last.secure_url = Some(meta.content.clone()),
                    None => videos.push(OgVideo {
                        secure_url: Some(meta.content.clone()),
                        ..Default::default()
                    }),
                },
                "og:video:width" => {
                    if let Some(last) = videos.last_mut() {
                        last.width = meta.content.trim().parse().ok();
                    }
                }
                "og:video:height" => {
                    if let Some(last) = videos.last_mut() {
                        last.height = meta.content.trim().parse().ok();
                    }
                }
                _ => {}
            }
        }
        videos
    }
}
