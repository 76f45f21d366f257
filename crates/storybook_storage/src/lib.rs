//! Object storage for generated storybook media.
//!
//! Illustrations and other media are written under caller-chosen paths
//! (e.g. `"{storybook_id}/{page_number}.png"`) and served from a public
//! base URL. The [`MediaStorage`] trait is the seam; [`FileSystemStorage`]
//! is the local implementation.
//!
//! # Example
//!
//! ```rust
//! use storybook_storage::{FileSystemStorage, MediaStorage, MediaType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/media", "http://localhost:8000/media")?;
//! let object = storage.put("sb-1/1", &[0u8; 16], MediaType::Png).await?;
//! assert_eq!(object.path, "sb-1/1.png");
//! assert_eq!(object.url, "http://localhost:8000/media/sb-1/1.png");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;

pub use filesystem::FileSystemStorage;
pub use storybook_error::{StorageError, StorageErrorKind};

use serde::{Deserialize, Serialize};
use storybook_error::StorybookResult;

/// Pluggable "put bytes, get URL" storage.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `data` at `path` plus the media type's extension, replacing any
    /// existing object, and return where it lives.
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        media_type: MediaType,
    ) -> StorybookResult<StoredObject>;

    /// Read an object back.
    async fn get(&self, path: &str) -> StorybookResult<Vec<u8>>;

    /// Public URL for an object path.
    fn public_url(&self, path: &str) -> String;

    /// Delete an object.
    async fn delete(&self, path: &str) -> StorybookResult<()>;

    /// Whether an object exists.
    async fn exists(&self, path: &str) -> StorybookResult<bool>;
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Path within storage, including extension
    pub path: String,
    /// Public URL
    pub url: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// SHA-256 of the content, hex encoded
    pub content_hash: String,
    /// MIME type
    pub mime_type: String,
}

/// Media formats the service stores.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
    /// WebP image
    Webp,
    /// MP3 audio
    Mp3,
}

impl MediaType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Webp => "image/webp",
            MediaType::Mp3 => "audio/mpeg",
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Png => "png",
            MediaType::Jpeg => "jpg",
            MediaType::Webp => "webp",
            MediaType::Mp3 => "mp3",
        }
    }

    /// Parse a MIME type.
    ///
    /// ```
    /// use storybook_storage::MediaType;
    ///
    /// assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
    /// assert_eq!(MediaType::from_mime("text/plain"), None);
    /// ```
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/webp" => Some(MediaType::Webp),
            "audio/mpeg" | "audio/mp3" => Some(MediaType::Mp3),
            _ => None,
        }
    }
}
