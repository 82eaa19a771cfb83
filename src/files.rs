//! Flat-directory file discovery shared by the relabeler and the splitter.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::BsortError;

pub const IMAGE_EXTENSION: &str = "jpg";
pub const LABEL_EXTENSION: &str = "txt";

/// Files found directly inside a directory.
#[derive(Debug, Default)]
pub struct Listing {
    /// UTF-8 names, sorted.
    pub names: Vec<String>,
    /// Lossy renderings of names that are not valid UTF-8, sorted.
    pub unreadable: Vec<String>,
}

/// List the regular files directly inside `dir` whose extension is exactly
/// `ext`.
///
/// Names are returned sorted so callers see a stable order regardless of the
/// platform's enumeration order.
pub fn list_files(dir: &Path, ext: &str) -> Result<Listing, BsortError> {
    let mut listing = Listing::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| BsortError::DirectoryWalk {
            path: dir.to_path_buf(),
            message: source.to_string(),
        })?;

        if !entry.file_type().is_file() || !has_extension(entry.path(), ext) {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) => listing.names.push(name.to_string()),
            None => {
                let lossy = entry.file_name().to_string_lossy().into_owned();
                tracing::warn!(file = %lossy, "file name is not valid UTF-8");
                listing.unreadable.push(lossy);
            }
        }
    }

    listing.names.sort();
    listing.unreadable.sort();
    Ok(listing)
}

/// The label file name paired with an image file name.
pub fn label_name_for(image_name: &str) -> PathBuf {
    Path::new(image_name).with_extension(LABEL_EXTENSION)
}

fn has_extension(path: &Path, allowed: &str) -> bool {
    path.extension().is_some_and(|ext| ext == allowed)
}
