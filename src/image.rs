use crate::error::Result;
use crate::reader::CoverRef;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a cover image into `output_dir`, returning the file path
pub fn save_cover(cover: &CoverRef, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let mut filename = clean_filename(&cover.href);
    if Path::new(&filename).extension().is_none() {
        if let Some(ext) = extension_for(&cover.media_type) {
            filename = format!("{filename}.{ext}");
        }
    }

    let dest = output_dir.join(filename);
    fs::write(&dest, &cover.data)?;
    Ok(dest)
}

fn clean_filename(href: &str) -> String {
    let path = href.split('#').next().unwrap_or(href);
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "cover".to_string())
}

fn extension_for(media_type: &str) -> Option<&'static str> {
    match media_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
