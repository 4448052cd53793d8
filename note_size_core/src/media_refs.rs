//! Extraction of media filenames referenced from note field markup
//!
//! Recognizes `[sound:file]` tags and `src`/`data` attributes of
//! `img`, `audio`, `video`, `source` and `object` elements. Remote URLs and
//! inline `data:` URIs are not media files and are skipped.

use crate::types::MediaFile;
use once_cell::sync::Lazy;
use regex::Regex;

static SOUND_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[sound:([^\]]+)\]").expect("valid sound regex"));

static ATTR_DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(?:img|audio|video|source|object)\b[^>]*?\s(?:src|data)\s*=\s*"([^"]+)""#)
        .expect("valid double-quoted attribute regex")
});

static ATTR_SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(?:img|audio|video|source|object)\b[^>]*?\s(?:src|data)\s*=\s*'([^']+)'"#)
        .expect("valid single-quoted attribute regex")
});

static ATTR_UNQUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(?:img|audio|video|source|object)\b[^>]*?\s(?:src|data)\s*=\s*([^\s"'>]+)"#)
        .expect("valid unquoted attribute regex")
});

/// Return every local media filename referenced by `text`, in order of first
/// appearance and without duplicates.
pub fn extract_media_refs(text: &str) -> Vec<MediaFile> {
    let mut found: Vec<(usize, MediaFile)> = Vec::new();

    for regex in [
        &*SOUND_TAG,
        &*ATTR_DOUBLE_QUOTED,
        &*ATTR_SINGLE_QUOTED,
        &*ATTR_UNQUOTED,
    ] {
        for captures in regex.captures_iter(text) {
            if let Some(m) = captures.get(1) {
                found.push((m.start(), unescape_html(m.as_str().trim())));
            }
        }
    }

    found.sort_by_key(|(position, _)| *position);

    let mut files: Vec<MediaFile> = Vec::with_capacity(found.len());
    for (_, file) in found {
        if is_local_file(&file) && !files.contains(&file) {
            files.push(file);
        }
    }
    files
}

fn is_local_file(reference: &str) -> bool {
    !reference.is_empty() && !reference.contains("://") && !reference.starts_with("data:")
}

fn unescape_html(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_img_and_sound_refs() {
        let text = r#"Files: <img src="picture.jpg"> [sound:sound.mp3]"#;
        assert_eq!(extract_media_refs(text), vec!["picture.jpg", "sound.mp3"]);
    }

    #[test]
    fn test_quote_styles() {
        let text = r#"<img src='a.png'><img class="x" src=b.png><IMG SRC="c.png">"#;
        assert_eq!(extract_media_refs(text), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let text = r#"<img src="picture.jpg"> <img src="picture.jpg">"#;
        assert_eq!(extract_media_refs(text), vec!["picture.jpg"]);
    }

    #[test]
    fn test_remote_and_inline_refs_are_skipped() {
        let text = r#"<img src="https://example.com/x.png"><img src="data:image/png;base64,AAAA">"#;
        assert!(extract_media_refs(text).is_empty());
    }

    #[test]
    fn test_media_elements_and_entities() {
        let text = r#"<video src="clip.mp4"></video><object data="doc.pdf"></object><img src="tom&amp;jerry.png">"#;
        assert_eq!(
            extract_media_refs(text),
            vec!["clip.mp4", "doc.pdf", "tom&jerry.png"]
        );
    }

    #[test]
    fn test_data_src_attribute_is_not_a_src() {
        let text = r#"<img data-src="lazy.png" src="real.png">"#;
        assert_eq!(extract_media_refs(text), vec!["real.png"]);
    }

    #[test]
    fn test_plain_text_has_no_refs() {
        assert!(extract_media_refs("no media here").is_empty());
    }
}
