//! Upload persistence for cover images and PDFs.
//!
//! Files land beneath the uploads root (`covers/`, `pdfs/`) under uuid
//! filenames; book rows store the relative path and the whole root is served
//! statically under `/uploads`. An upload is a single atomic attachment;
//! there is no partial or resumable transfer handling.

use std::path::PathBuf;

use uuid::Uuid;

use crate::domain::DomainError;

pub const COVERS_DIR: &str = "covers";
pub const PDFS_DIR: &str = "pdfs";

/// Public URL for a stored relative path.
pub fn public_url(rel_path: &str) -> String {
    format!("/uploads/{}", rel_path)
}

#[derive(Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(COVERS_DIR)).await?;
        tokio::fs::create_dir_all(self.root.join(PDFS_DIR)).await?;
        Ok(())
    }

    /// Persist a cover image. The bytes must decode as an image; the stored
    /// extension comes from the detected format, not the client filename.
    pub async fn save_cover(&self, bytes: &[u8]) -> Result<String, DomainError> {
        let format = image::guess_format(bytes)
            .map_err(|_| DomainError::Validation("cover must be an image file".to_string()))?;
        image::load_from_memory(bytes)
            .map_err(|_| DomainError::Validation("cover image could not be decoded".to_string()))?;

        let ext = format.extensions_str().first().copied().unwrap_or("img");
        let rel = format!("{}/{}.{}", COVERS_DIR, Uuid::new_v4(), ext);
        self.write(&rel, bytes).await?;
        Ok(rel)
    }

    /// Persist a PDF, checked by magic number.
    pub async fn save_pdf(&self, bytes: &[u8]) -> Result<String, DomainError> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(DomainError::Validation(
                "file does not look like a PDF".to_string(),
            ));
        }

        let rel = format!("{}/{}.pdf", PDFS_DIR, Uuid::new_v4());
        self.write(&rel, bytes).await?;
        Ok(rel)
    }

    async fn write(&self, rel: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Internal(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> Storage {
        Storage::new(std::env::temp_dir().join(format!("maktaba-test-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn rejects_non_pdf_bytes() {
        let storage = temp_storage();
        let err = storage.save_pdf(b"<html>nope</html>").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn stores_pdf_under_pdfs_dir() {
        let storage = temp_storage();
        let rel = storage.save_pdf(b"%PDF-1.7 fake body").await.unwrap();
        assert!(rel.starts_with("pdfs/"));
        assert!(rel.ends_with(".pdf"));
        assert_eq!(public_url(&rel), format!("/uploads/{}", rel));
    }

    #[tokio::test]
    async fn rejects_non_image_cover() {
        let storage = temp_storage();
        let err = storage.save_cover(b"definitely not an image").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
