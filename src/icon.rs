use crate::document::DocumentModel;
use crate::fetcher::Fetcher;
use tracing::debug;

/// `link` relations that advertise an icon.
const ICON_RELS: &[&str] = &[
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
    "mask-icon",
    "fluid-icon",
];

/// A discovered icon, before ranking. URLs stay as written in the markup;
/// resolution happens after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCandidate {
    pub url: String,
    pub width: i64,
    pub height: i64,
    pub mime_type: String,
    pub file_ext: String,
}

/// Fixed priority for icon formats: vector first, then raster by typical
/// quality. Unknown types rank lowest.
fn format_rank(mime_type: &str) -> i32 {
    match mime_type {
        "image/svg+xml" => 5,
        "image/png" => 4,
        "image/x-icon" | "image/vnd.microsoft.icon" => 3,
        "image/jpeg" => 2,
        _ => 0,
    }
}

fn mime_from_ext(ext: &str) -> &'static str {
    match ext {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "",
    }
}

fn ext_from_url(href: &str) -> String {
    let path = href
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(href);
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Largest width declared in a `sizes` attribute ("16x16 32x32"); "any" and
/// malformed tokens count as zero.
fn width_from_sizes(sizes: Option<&str>) -> i64 {
    sizes
        .unwrap_or("")
        .split_ascii_whitespace()
        .filter_map(|token| {
            let (w, _) = token.split_once(|c| c == 'x' || c == 'X')?;
            w.parse::<i64>().ok()
        })
        .max()
        .unwrap_or(0)
}

/// Favicon discovery pass over the page's `<link>` icon relations.
pub fn discover_icons(doc: &DocumentModel) -> Vec<IconCandidate> {
    let mut candidates = Vec::new();

    for link in doc.links() {
        let is_icon_rel = link
            .rel
            .as_deref()
            .map(|rel| ICON_RELS.contains(&rel.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_icon_rel {
            continue;
        }
        let href = match link.href.as_deref() {
            Some(href) if !href.is_empty() => href,
            _ => continue,
        };

        let file_ext = ext_from_url(href);
        let mime_type = link
            .media_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| mime_from_ext(&file_ext).to_string());
        let width = width_from_sizes(link.sizes.as_deref());

        candidates.push(IconCandidate {
            url: href.to_string(),
            width,
            height: width,
            mime_type,
            file_ext,
        });
    }

    candidates
}

/// Rank candidates by format then declared width and take the winner.
/// The sort is stable, so identical inputs always order the same way.
pub fn select_best(mut candidates: Vec<IconCandidate>) -> Option<IconCandidate> {
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| {
        format_rank(&b.mime_type)
            .cmp(&format_rank(&a.mime_type))
            .then(b.width.cmp(&a.width))
    });
    candidates.into_iter().next()
}

/// Pick the page's icon: the best markup candidate, or the well-known
/// `/favicon.ico` path when the markup declares none and the server
/// actually serves it. Absence of any icon is not an error.
pub async fn select_icon(doc: &DocumentModel, fetcher: &Fetcher) -> Option<String> {
    let candidates = discover_icons(doc);

    if candidates.is_empty() {
        let well_known = doc.base_url().join("/favicon.ico").ok()?;
        if fetcher.probe_ok(&well_known).await {
            debug!(url = %well_known, "Using well-known favicon path");
            return Some(well_known.to_string());
        }
        return None;
    }

    let best = select_best(candidates)?;
    debug!(url = %best.url, mime_type = %best.mime_type, width = best.width, "Icon selected");
    doc.resolve(&best.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc(html: &str) -> DocumentModel {
        DocumentModel::parse(html, Url::parse("https://example.com/").unwrap())
    }

    fn best_url(html: &str) -> Option<String> {
        let d = doc(html);
        select_best(discover_icons(&d)).and_then(|c| d.resolve(&c.url))
    }

    #[test]
    fn test_format_rank_ordering() {
        assert!(format_rank("image/svg+xml") > format_rank("image/png"));
        assert!(format_rank("image/png") > format_rank("image/x-icon"));
        assert!(format_rank("image/x-icon") > format_rank("image/jpeg"));
        assert!(format_rank("image/jpeg") > format_rank("image/webp"));
        assert_eq!(
            format_rank("image/x-icon"),
            format_rank("image/vnd.microsoft.icon")
        );
    }

    #[test]
    fn test_width_from_sizes() {
        assert_eq!(width_from_sizes(Some("16x16")), 16);
        assert_eq!(width_from_sizes(Some("16x16 32x32")), 32);
        assert_eq!(width_from_sizes(Some("any")), 0);
        assert_eq!(width_from_sizes(None), 0);
    }

    #[test]
    fn test_ext_from_url() {
        assert_eq!(ext_from_url("/favicon.ico"), "ico");
        assert_eq!(ext_from_url("/icon.PNG?v=2"), "png");
        assert_eq!(ext_from_url("/no-extension"), "");
    }

    #[test]
    fn test_no_markup_icons_yields_no_candidates() {
        assert!(discover_icons(&doc("<title>x</title>")).is_empty());
    }

    #[test]
    fn test_png_selected() {
        assert_eq!(
            best_url("<link rel=\"icon\" href=\"/icon.png\" type=\"image/png\">"),
            Some("https://example.com/icon.png".to_string())
        );
    }

    #[test]
    fn test_svg_beats_everything() {
        let html = concat!(
            "<link rel=\"icon\" href=\"/big.png\" sizes=\"512x512\">",
            "<link rel=\"icon\" href=\"/icon.svg\" type=\"image/svg+xml\">",
        );
        assert_eq!(
            best_url(html),
            Some("https://example.com/icon.svg".to_string())
        );
    }

    #[test]
    fn test_width_breaks_ties() {
        let html = concat!(
            "<link rel=\"icon\" href=\"/small.png\" sizes=\"16x16\">",
            "<link rel=\"icon\" href=\"/large.png\" sizes=\"192x192\">",
        );
        assert_eq!(
            best_url(html),
            Some("https://example.com/large.png".to_string())
        );
    }

    #[test]
    fn test_sort_is_deterministic_and_idempotent() {
        let d = doc(concat!(
            "<link rel=\"icon\" href=\"/a.png\" sizes=\"32x32\">",
            "<link rel=\"icon\" href=\"/b.ico\">",
            "<link rel=\"apple-touch-icon\" href=\"/c.png\" sizes=\"180x180\">",
        ));
        let candidates = discover_icons(&d);
        let first = select_best(candidates.clone());
        let second = select_best(candidates);
        assert_eq!(first, second);
        assert_eq!(first.unwrap().url, "/c.png");
    }

    #[test]
    fn test_mime_type_from_extension_when_undeclared() {
        let d = doc("<link rel=\"shortcut icon\" href=\"/fav.png\">");
        let icons = discover_icons(&d);
        assert_eq!(icons[0].mime_type, "image/png");
    }
}
