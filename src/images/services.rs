use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe/";

pub struct UploadItem {
    pub filename: String,
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Storage key for a new recipe image: a random name under
/// `RECIPE_IMAGE_DIR` that keeps the uploaded file's extension. Any
/// directory part of the client-supplied name is dropped first.
pub fn recipe_image_key(filename: &str) -> AppResult<String> {
    let base = filename.rsplit(&['/', '\\'][..]).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(format!("{}{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), ext))
        }
        _ => Err(AppError::Validation(
            r#"The filename must contain a "." symbol and extension."#.into(),
        )),
    }
}

fn mime_from_ext(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Uploads the image and returns its storage key.
pub async fn store_recipe_image(st: &AppState, item: UploadItem) -> AppResult<String> {
    if item.body.is_empty() {
        return Err(AppError::Validation("The submitted image is empty".into()));
    }
    let key = recipe_image_key(&item.filename)?;
    let content_type = item
        .content_type
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| mime_from_ext(&key).to_string());
    st.storage
        .put_object(&key, item.body, &content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%key, %content_type, "recipe image stored");
    Ok(key)
}

/// Best effort: a failed delete only leaves an orphaned object behind.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to delete recipe image");
    }
}

pub async fn presign_image(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, st.config.storage.url_ttl_secs)
        .await
        .with_context(|| format!("presign url for {}", key))
}

#[cfg(test)]
mod image_tests {
    use super::*;

    #[test]
    fn key_keeps_extension_and_randomizes_name() {
        let key = recipe_image_key("test.jpg").unwrap();
        assert!(key.starts_with(RECIPE_IMAGE_DIR));
        assert!(key.ends_with(".jpg"));
        let stem = key
            .trim_start_matches(RECIPE_IMAGE_DIR)
            .trim_end_matches(".jpg");
        assert!(Uuid::parse_str(stem).is_ok());
        assert_ne!(key, recipe_image_key("test.jpg").unwrap());
    }

    #[test]
    fn key_uses_last_extension() {
        let key = recipe_image_key("archive.tar.gz").unwrap();
        assert!(key.ends_with(".gz"));
    }

    #[test]
    fn filename_without_extension_is_rejected() {
        let err = recipe_image_key("image").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("extension")));
    }

    #[test]
    fn directory_parts_never_reach_the_key() {
        let key = recipe_image_key("photos/dinner.png").unwrap();
        assert!(key.ends_with(".png"));
        assert_eq!(key.matches('/').count(), 2);

        let key = recipe_image_key(r"C:\Users\me\lunch.jpeg").unwrap();
        assert!(key.ends_with(".jpeg"));
        assert!(!key.contains('\\'));

        for bad in ["x./../../../etc/passwd", "x.png/", "a.b\\c", "photo.", "x.p g"] {
            assert!(
                matches!(recipe_image_key(bad), Err(AppError::Validation(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn mime_guess() {
        assert_eq!(mime_from_ext("uploads/recipe/a.JPG"), "image/jpeg");
        assert_eq!(mime_from_ext("uploads/recipe/a.png"), "image/png");
        assert_eq!(mime_from_ext("uploads/recipe/a.webp"), "image/webp");
        assert_eq!(mime_from_ext("uploads/recipe/a.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn store_and_discard_round_through_storage() {
        let state = AppState::fake();
        let key = store_recipe_image(
            &state,
            UploadItem {
                filename: "photo.png".into(),
                body: Bytes::from_static(b"\x89PNG"),
                content_type: None,
            },
        )
        .await
        .unwrap();
        let url = presign_image(&state, &key).await.unwrap();
        assert!(url.contains(&key));
        discard_image(&state, &key).await;
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let state = AppState::fake();
        let err = store_recipe_image(
            &state,
            UploadItem {
                filename: "photo.png".into(),
                body: Bytes::new(),
                content_type: Some("image/png".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
