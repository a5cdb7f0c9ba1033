use rfd::FileDialog;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AcquireError;
use crate::state::AcquiredImage;

/// Extensions offered by the picker's "Images" filter
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff",
];

/// Show the native file picker
/// Returns None if the user cancelled
pub fn pick_image() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Select a Leaf Photo")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All files", &["*"])
        .pick_file()
}

/// Read a file into an acquired image
///
/// Any file is accepted; the MIME type is guessed from the extension and
/// falls back to `application/octet-stream`.
pub async fn read_image(path: PathBuf) -> Result<AcquiredImage, AcquireError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AcquireError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    info!("📂 Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime_type);

    Ok(AcquiredImage::new(bytes, mime_type, display_name(&path)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_png_file() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake body").unwrap();

        let image = read_image(file.path().to_path_buf()).await.unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"\x89PNG fake body");
        assert!(image.file_name.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let mut file = tempfile::Builder::new().suffix(".leafdata").tempfile().unwrap();
        file.write_all(b"whatever").unwrap();

        let image = read_image(file.path().to_path_buf()).await.unwrap();
        assert_eq!(image.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.jpg");

        let result = read_image(missing.clone()).await;
        assert!(matches!(result, Err(AcquireError::Read { path, .. }) if path == missing));
    }
}
