//! 图片上传存储
//!
//! 校验上传内容后写入上传目录，返回对外访问 URL。

use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::config::UploadConfig;
use crate::error::{AppError, Result};

/// 支持的图片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageFormat {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// 根据文件头识别格式
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

/// 本地磁盘图片存储
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_path: String,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_path: config.public_path.trim_end_matches('/').to_string(),
            max_bytes: config.max_image_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// 校验并保存图片，返回 `{public_path}/{collection}/{file}`
    ///
    /// 声明的类型与文件头必须一致。
    pub async fn store(
        &self,
        collection: &str,
        id: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::Upload("图片内容为空".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Upload(format!(
                "图片大小 {} 字节超过上限 {} 字节",
                bytes.len(),
                self.max_bytes
            )));
        }

        let sniffed = ImageFormat::sniff(bytes)
            .ok_or_else(|| AppError::Upload("仅支持 png、jpeg、webp、gif 图片".to_string()))?;
        if let Some(declared) = content_type {
            match ImageFormat::from_content_type(declared) {
                Some(format) if format == sniffed => {}
                _ => {
                    return Err(AppError::Upload(format!(
                        "声明的类型 {} 与图片内容不符",
                        declared
                    )));
                }
            }
        }

        let collection = safe_segment(collection)?;
        let id = safe_segment(id)?;
        let file_name = format!("{}-{}.{}", id, Uuid::new_v4().simple(), sniffed.extension());

        let target_dir = self.dir.join(collection);
        tokio::fs::create_dir_all(&target_dir).await?;
        tokio::fs::write(target_dir.join(&file_name), bytes).await?;

        let url = format!("{}/{}/{}", self.public_path, collection, file_name);
        info!(collection, id, bytes = bytes.len(), url = %url, "图片已保存");
        Ok(url)
    }
}

/// 路径片段只允许字母数字、`-` 与 `_`
fn safe_segment(segment: &str) -> Result<&str> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(segment)
    } else {
        Err(AppError::Upload(format!("非法路径片段: {}", segment)))
    }
}
