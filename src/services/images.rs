use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{config::CloudinaryConfig, error::UploadError};

pub const TRIP_FOLDER: &str = "listravel/trips";
pub const THUMBNAIL_FOLDER: &str = "listravel/thumbnails";
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 400;

/// Raw image bytes picked in the form, not yet hosted anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl ImageUpload {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Local preview, rendered without uploading anything.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }

    pub fn from_data_url(raw: &str, file_name: impl Into<String>) -> Option<Self> {
        let rest = raw.strip_prefix("data:")?;
        let (content_type, payload) = rest.split_once(";base64,")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(Self::new(bytes, file_name, content_type))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub secure_url: String,
    pub public_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// `folder` defaults to [`TRIP_FOLDER`].
    async fn upload(
        &self,
        image: &ImageUpload,
        folder: Option<&str>,
    ) -> Result<UploadedImage, UploadError>;

    /// Deleting hosted images needs the host's private API secret, which
    /// this process never holds. Nothing is removed remotely.
    async fn delete(&self, public_id: &str) {
        warn!(public_id, "image deletion must run on a trusted backend; skipping");
    }
}

/// Inserts a scale-fit, auto-quality resize right after `/upload/`.
/// Anything that is not an http(s) URL with that path segment, `data:`
/// previews included, is returned unchanged.
pub fn thumbnail_url(image_url: &str, width: u32) -> String {
    let Ok(mut url) = Url::parse(image_url) else {
        return image_url.to_string();
    };
    if !matches!(url.scheme(), "http" | "https") {
        return image_url.to_string();
    }
    let path = match url.path().split_once("/upload/") {
        Some((head, tail)) => format!("{head}/upload/w_{width},c_scale,q_auto/{tail}"),
        None => return image_url.to_string(),
    };
    url.set_path(&path);
    url.into()
}

/// Cloudinary unsigned uploads through an upload preset.
#[derive(Clone)]
pub struct CloudinaryHost {
    http: Client,
    upload_url: Arc<String>,
    upload_preset: Arc<String>,
}

impl CloudinaryHost {
    pub fn new(http: Client, config: &CloudinaryConfig) -> Self {
        Self {
            http,
            upload_url: Arc::new(format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.cloud_name
            )),
            upload_preset: Arc::new(config.upload_preset.clone()),
        }
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(
        &self,
        image: &ImageUpload,
        folder: Option<&str>,
    ) -> Result<UploadedImage, UploadError> {
        let folder = folder.unwrap_or(TRIP_FOLDER);
        let file = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.as_str().to_owned())
            .text("folder", folder.to_owned());

        let response = self
            .http
            .post(self.upload_url.as_str())
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, file = %image.file_name, "image upload rejected");
            return Err(UploadError::Status(status.as_u16()));
        }
        let uploaded = response.json::<UploadedImage>().await?;
        debug!(public_id = %uploaded.public_id, "image uploaded");
        Ok(uploaded)
    }
}

/// Keeps nothing remotely: the "hosted" URL is the image itself as a
/// `data:` URL, which browsers render directly.
#[derive(Default)]
pub struct MemoryImageHost {
    uploads: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageHost for MemoryImageHost {
    async fn upload(
        &self,
        image: &ImageUpload,
        folder: Option<&str>,
    ) -> Result<UploadedImage, UploadError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UploadError::Status(502));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedImage {
            secure_url: image.data_url(),
            public_id: format!(
                "{}/{}",
                folder.unwrap_or(TRIP_FOLDER),
                uuid::Uuid::new_v4()
            ),
            width: 0,
            height: 0,
        })
    }
}
