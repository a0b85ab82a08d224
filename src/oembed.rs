use crate::document::DocumentModel;
use crate::extractor::PageMetadata;
use crate::fetcher::Fetcher;
use crate::{Dimension, Player, SummaryError};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;
use url::Url;

pub const TYPE_PHOTO: &str = "photo";
pub const TYPE_VIDEO: &str = "video";
pub const TYPE_LINK: &str = "link";
pub const TYPE_RICH: &str = "rich";

/// Permission tokens an embedded iframe may request. Anything else rejects
/// the whole oEmbed result.
pub const SAFE_PERMISSIONS: &[&str] = &[
    "autoplay",
    "clipboard-write",
    "fullscreen",
    "encrypted-media",
    "picture-in-picture",
    "web-share",
];

/// Noisy device-sensor permissions silently dropped before the safety check.
const IGNORED_PERMISSIONS: &[&str] = &["gyroscope", "accelerometer"];

/// Permissions granted to players built from raw OGP/Twitter metadata.
const FALLBACK_PERMISSIONS: &[&str] = &["autoplay", "encrypted-media", "fullscreen"];

static IFRAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("iframe").expect("static selector"));

/// oEmbed 1.0 response, as consumed by this pipeline.
///
/// `width`/`height` stay as raw JSON values: providers emit integers,
/// floats, and numeric strings.
#[derive(Debug, Clone, Deserialize)]
pub struct OembedDocument {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub width: Option<serde_json::Value>,
    #[serde(default)]
    pub height: Option<serde_json::Value>,
}

fn dimension_from_json(value: &serde_json::Value) -> Option<Dimension> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Dimension::Int)
            .or_else(|| n.as_f64().map(Dimension::Float)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Dimension::Int)
                .or_else(|_| s.parse::<f64>().map(Dimension::Float))
                .ok()
        }
        _ => None,
    }
}

fn cap_height(height: Dimension) -> Dimension {
    match height {
        Dimension::Int(h) if h > 1024 => Dimension::Int(1024),
        Dimension::Float(h) if h > 1024.0 => Dimension::Float(1024.0),
        other => other,
    }
}

/// Structural and permission validation of an oEmbed response.
///
/// Runs every check in order and fails closed; a rejection reason is only
/// ever surfaced through logging, never to the caller.
pub fn validate_oembed(oembed: &OembedDocument) -> Result<Player, String> {
    if oembed.version != "1.0" {
        return Err(format!("invalid version: {}", oembed.version));
    }
    if oembed.kind != TYPE_RICH && oembed.kind != TYPE_VIDEO {
        return Err(format!("unsupported type: {}", oembed.kind));
    }
    if !oembed.html.contains("<iframe") {
        return Err("html does not contain an iframe".to_string());
    }

    let fragment = Html::parse_document(&oembed.html);
    let iframes: Vec<_> = fragment.select(&IFRAME_SELECTOR).collect();
    if iframes.len() != 1 {
        return Err(format!("expected exactly one iframe, found {}", iframes.len()));
    }
    let iframe = iframes[0];

    // A bare iframe fragment parses under the implicit html/body pair and
    // nothing else; extra wrapper markup deepens the chain.
    let ancestor_depth = iframe
        .ancestors()
        .filter(|node| node.value().is_element())
        .count();
    if ancestor_depth != 2 {
        return Err(format!("iframe nested at depth {ancestor_depth}"));
    }

    let src = iframe
        .value()
        .attr("src")
        .ok_or_else(|| "iframe src is missing".to_string())?;
    let src_url = Url::parse(src).map_err(|e| format!("iframe src unparseable: {e}"))?;
    if src_url.scheme() != "https" {
        return Err(format!("iframe src scheme is {}", src_url.scheme()));
    }

    // The iframe's own attribute wins; the JSON value is only consulted when
    // the attribute is absent, not when it fails to parse.
    let width = match iframe.value().attr("width") {
        Some(attr) => attr.trim().parse::<i64>().ok().map(Dimension::Int),
        None => oembed.width.as_ref().and_then(dimension_from_json),
    };
    let height = match iframe.value().attr("height") {
        Some(attr) => attr.trim().parse::<i64>().ok().map(Dimension::Int),
        None => oembed.height.as_ref().and_then(dimension_from_json),
    };
    let height = cap_height(height.ok_or_else(|| "player height is required".to_string())?);

    let mut allow: Vec<String> = iframe
        .value()
        .attr("allow")
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty() && !IGNORED_PERMISSIONS.contains(token))
        .map(str::to_string)
        .collect();
    if iframe.value().attr("allowfullscreen").is_some() {
        allow.push("fullscreen".to_string());
    }
    if let Some(unsafe_token) = allow
        .iter()
        .find(|token| !SAFE_PERMISSIONS.contains(&token.as_str()))
    {
        return Err(format!("unsafe permission requested: {unsafe_token}"));
    }

    Ok(Player {
        url: src.to_string(),
        width,
        height: Some(height),
        allow,
    })
}

async fn fetch_oembed(
    doc: &DocumentModel,
    fetcher: &Fetcher,
    user_agent: Option<&str>,
) -> Result<OembedDocument, SummaryError> {
    let href = doc
        .link_href_by_type("application/json+oembed")
        .ok_or_else(|| SummaryError::ExtractError("no oEmbed discovery link".to_string()))?;
    let url = doc.base_url().join(href)?;
    fetcher.fetch_json(&url, user_agent).await
}

/// Player built from Twitter Card / OGP video metadata when oEmbed is
/// absent or rejected. `None` when no source yields a player URL.
fn fallback_player(doc: &DocumentModel, meta: &PageMetadata) -> Option<Player> {
    let twitter = &meta.twitter_player;
    let mut url = twitter.url.as_deref().and_then(|u| doc.resolve(u));
    let mut width = twitter.width.map(Dimension::Int);
    let mut height = twitter.height.map(Dimension::Int);

    if url.is_none() {
        for video in &meta.og_videos {
            let candidate = video.url.as_deref().or(video.secure_url.as_deref());
            let resolved = match candidate.and_then(|u| doc.resolve(u)) {
                Some(resolved) => resolved,
                None => continue,
            };
            url = Some(resolved);
            width = video.width.map(Dimension::Int);
            height = video.height.map(Dimension::Int);
            break;
        }
    }

    url.map(|url| Player {
        url,
        width,
        height,
        allow: FALLBACK_PERMISSIONS.iter().map(|s| s.to_string()).collect(),
    })
}

/// Produce the page's player descriptor: a validated oEmbed result when one
/// exists, the direct-metadata fallback otherwise.
pub async fn resolve_player(
    doc: &DocumentModel,
    fetcher: &Fetcher,
    meta: &PageMetadata,
    user_agent: Option<&str>,
) -> Option<Player> {
    match fetch_oembed(doc, fetcher, user_agent).await {
        Ok(oembed) => match validate_oembed(&oembed) {
            Ok(player) => {
                debug!(url = %player.url, "oEmbed player accepted");
                return Some(player);
            }
            Err(reason) => {
                debug!(reason = %reason, "oEmbed player rejected, using fallback");
            }
        },
        Err(e) => {
            debug!(error = %e, "No usable oEmbed document, using fallback");
        }
    }

    fallback_player(doc, meta)
}
