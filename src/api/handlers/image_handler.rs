//! 图片上传的公共处理

use axum::extract::Multipart;
use tracing::debug;

use crate::api::dto::ImageUploadResponse;
use crate::error::AppError;
use crate::services::{ContentService, ImageStore};
use crate::storage::repository::{Document, HasImage};

/// 上传表单中的图片字段名
pub const IMAGE_FIELD: &str = "image";

/// 读取 `image` 字段，保存后写回文档的 `image_url`
pub async fn upload_image<T: HasImage>(
    content: &ContentService<T>,
    images: &ImageStore,
    id: &str,
    mut multipart: Multipart,
) -> Result<ImageUploadResponse, AppError> {
    // 先确认文档存在，避免留下孤立文件
    content.get(id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        debug!(collection = T::COLLECTION, id, bytes = bytes.len(), "Receiving image upload");

        let url = images
            .store(T::COLLECTION, id, content_type.as_deref(), &bytes)
            .await?;
        let doc = content.set_image_url(id, Some(url.clone())).await?;

        return Ok(ImageUploadResponse {
            id: doc.id().to_string(),
            image_url: url,
        });
    }

    Err(AppError::Upload(format!(
        "missing multipart field '{}'",
        IMAGE_FIELD
    )))
}
