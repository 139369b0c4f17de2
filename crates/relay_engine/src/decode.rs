use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use relay_logging::relay_debug;

/// Decodes a search result page: BOM, then the `Content-Type` charset, then detection.
///
/// Malformed sequences become U+FFFD so one bad byte never hides the rest of the page.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        relay_debug!("Result page had malformed {} sequences; replaced", encoding.name());
    }
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches(&[' ', '"', '\''][..]).to_string())
    })
}
