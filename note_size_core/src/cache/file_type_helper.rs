//! Media classification of filenames by extension

use crate::cache::lock::CacheLock;
use crate::cache::traits::Cache;
use crate::error::Result;
use crate::types::{FileType, MediaFile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Extensions whose registered MIME type is `image/*`
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "gif", "bmp", "webp", "svg", "svgz", "tif", "tiff", "ico", "heic",
    "heif", "avif", "jxl", "apng",
];

/// Extensions whose registered MIME type is `audio/*`
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "ogg", "oga", "opus", "wav", "flac", "m4a", "aac", "wma", "mid", "midi", "amr", "spx",
    "aif", "aiff", "weba", "mka",
];

/// Extensions whose registered MIME type is `video/*`
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "webm", "mkv", "avi", "mov", "ogv", "mpg", "mpeg", "flv", "wmv", "3gp", "3g2",
    "ts", "m2ts",
];

/// Extensions that guess wrong but are in practice images saved from the web
const IMAGE_OVERRIDES: &[&str] = &["ashx", "axd", "cms", "jpglarge"];

/// Classify a filename without consulting any cache
pub fn classify(filename: &str) -> FileType {
    let Some(extension) = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
    else {
        return FileType::Other;
    };
    let extension = extension.as_str();

    if IMAGE_OVERRIDES.contains(&extension) || IMAGE_EXTENSIONS.contains(&extension) {
        FileType::Image
    } else if AUDIO_EXTENSIONS.contains(&extension) {
        FileType::Audio
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        FileType::Video
    } else {
        FileType::Other
    }
}

#[derive(Default, Serialize, Deserialize)]
struct FileTypeState {
    types: HashMap<MediaFile, FileType>,
}

/// Per-filename cache of [`classify`]
#[derive(Default)]
pub struct FileTypeHelper {
    lock: CacheLock<FileTypeState>,
}

impl FileTypeHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_file_type(&self, filename: &str, use_cache: bool) -> FileType {
        let _guard = self.lock.hold();
        if use_cache
            && let Some(file_type) = self.lock.read(|state| state.types.get(filename).copied())
        {
            return file_type;
        }
        let file_type = classify(filename);
        self.lock
            .write(|state| state.types.insert(filename.to_string(), file_type));
        file_type
    }
}

impl Cache for FileTypeHelper {
    fn name(&self) -> &'static str {
        "file_type_helper"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| state.types.len())
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("picture.jpg"), FileType::Image);
        assert_eq!(classify("PICTURE.JPEG"), FileType::Image);
        assert_eq!(classify("sound.mp3"), FileType::Audio);
        assert_eq!(classify("clip.webm"), FileType::Video);
        assert_eq!(classify("notes.pdf"), FileType::Other);
        assert_eq!(classify("no_extension"), FileType::Other);
    }

    #[test]
    fn test_overrides_resolve_to_image() {
        for name in ["handler.ashx", "resource.axd", "page.cms", "photo.jpglarge"] {
            assert_eq!(classify(name), FileType::Image, "{name}");
        }
    }

    #[test]
    fn test_extension_tables_do_not_overlap() {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        for ext in IMAGE_EXTENSIONS
            .iter()
            .chain(AUDIO_EXTENSIONS)
            .chain(VIDEO_EXTENSIONS)
        {
            assert!(seen.insert(ext), "Duplicate extension found: {ext}");
        }
    }

    #[test]
    fn test_helper_caches_per_filename() {
        let helper = FileTypeHelper::new();
        assert_eq!(helper.get_file_type("a.png", true), FileType::Image);
        assert_eq!(helper.get_file_type("a.png", true), FileType::Image);
        assert_eq!(helper.get_file_type("b.ogg", true), FileType::Audio);
        assert_eq!(helper.cache_size(), 2);
    }
}
