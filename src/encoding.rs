/// Charset sniffing is bounded to the leading bytes of the body; anything
/// past the window cannot change the detected encoding.
const SNIFF_WINDOW: usize = 4096;

/// Decode response bytes to text.
///
/// The declared `Content-Type` charset parameter wins when it names a known
/// encoding; otherwise the first 4096 bytes are sniffed. Decoding never
/// fails: with no usable encoding the bytes pass through as lossy UTF-8.
pub fn decode_text(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, window.len() == body.len());
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract the charset parameter from a Content-Type header value.
pub fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// The media type portion of a Content-Type header: lowercased, parameters
/// stripped.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"Shift_JIS\""),
            Some("shift_jis".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("text/HTML; charset=utf-8"), "text/html");
        assert_eq!(media_type("application/json"), "application/json");
        assert_eq!(media_type(""), "");
    }

    #[test]
    fn test_decode_utf8_with_header() {
        let decoded = decode_text("こんにちは".as_bytes(), Some("text/html; charset=utf-8"));
        assert_eq!(decoded, "こんにちは");
    }

    #[test]
    fn test_decode_shift_jis_declared() {
        // "あ" in Shift_JIS
        let body = [0x82u8, 0xa0];
        let decoded = decode_text(&body, Some("text/html; charset=Shift_JIS"));
        assert_eq!(decoded, "あ");
    }

    #[test]
    fn test_decode_latin1_sniffed() {
        // "café" in ISO-8859-1, no charset declared
        let body = [0x63u8, 0x61, 0x66, 0xe9];
        let decoded = decode_text(&body, Some("text/html"));
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_sniffing() {
        let decoded = decode_text(b"plain ascii", Some("text/html; charset=bogus-enc"));
        assert_eq!(decoded, "plain ascii");
    }
}
