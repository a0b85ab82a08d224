/// Trim and clip a string to `max` Unicode scalar values, appending an
/// ellipsis marker when anything was cut.
pub fn clip(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.is_empty() {
        return String::new();
    }

    if s.chars().count() > max {
        let mut clipped: String = s.chars().take(max).collect();
        clipped.push_str("...");
        clipped
    } else {
        s.to_string()
    }
}

/// Decode the HTML entities that survive attribute extraction.
///
/// The parser already decodes entities once; pages that double-escape their
/// metadata still need this pass. `&amp;` goes last so a single level of
/// escaping is removed.
pub fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&#x2F;", "/")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

const TITLE_SEPARATORS: &[char] = &['-', '|', ':', '・'];

/// Strip a trailing `<separator> <sitename>` pattern from a page title.
///
/// Returns the title unchanged when the site name is empty, equals the whole
/// title, or is not a suffix preceded by a separator.
pub fn cleanup_title(title: &str, sitename: &str) -> String {
    if sitename.is_empty() || title == sitename {
        return title.to_string();
    }

    if let Some(stripped) = title.strip_suffix(sitename) {
        let lead = stripped.trim_end();
        if let Some(rest) = lead.strip_suffix(TITLE_SEPARATORS) {
            return rest.trim_end().to_string();
        }
    }

    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_string_untouched() {
        assert_eq!(clip("Hello", 100), "Hello");
        assert_eq!(clip("  padded  ", 100), "padded");
        assert_eq!(clip("", 100), "");
    }

    #[test]
    fn test_clip_counts_scalar_values() {
        let long: String = "あ".repeat(150);
        let clipped = clip(&long, 100);
        assert_eq!(clipped.chars().count(), 103);
        assert!(clipped.ends_with("..."));
        assert_eq!(&clipped[..3], "あ");
    }

    #[test]
    fn test_clip_exact_boundary() {
        let exact: String = "x".repeat(100);
        assert_eq!(clip(&exact, 100), exact);
        let over: String = "x".repeat(101);
        assert_eq!(clip(&over, 100), format!("{}...", "x".repeat(100)));
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(unescape_entities("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
        assert_eq!(unescape_entities("no entities"), "no entities");
        assert_eq!(unescape_entities("it&#39;s"), "it's");
    }

    #[test]
    fn test_cleanup_title_dash_suffix() {
        assert_eq!(
            cleanup_title("Strawberry Pasta - Alice's Site", "Alice's Site"),
            "Strawberry Pasta"
        );
    }

    #[test]
    fn test_cleanup_title_all_separators() {
        for sep in ['-', '|', ':', '・'] {
            assert_eq!(
                cleanup_title(&format!("Page {sep} Site"), "Site"),
                "Page",
                "separator {sep:?}"
            );
        }
    }

    #[test]
    fn test_cleanup_title_no_separator_kept() {
        assert_eq!(cleanup_title("Strawberry Site", "Site"), "Strawberry Site");
        assert_eq!(cleanup_title("Unrelated Title", "Site"), "Unrelated Title");
    }

    #[test]
    fn test_cleanup_title_equal_to_sitename_kept() {
        assert_eq!(cleanup_title("Site", "Site"), "Site");
    }

    #[test]
    fn test_cleanup_title_strips_to_empty() {
        assert_eq!(cleanup_title("- Site", "Site"), "");
    }
}
