//! Media relocation
//!
//! Carrier-hosted attachments expire, so each one is downloaded, hashed, and
//! republished on the object store before the broadcast goes out. Attachments
//! are handled concurrently and independently.

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use chorus_core::entities::MediaFile;
use chorus_core::error::ProviderError;

use crate::dto::Attachment;

use super::context::ServiceContext;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Per-attachment results of one relocation pass, in attachment order
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    pub files: Vec<MediaFile>,
}

impl RelocationReport {
    pub fn processed(&self) -> usize {
        self.files.iter().filter(|f| f.is_uploaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.processed()
    }

    /// Public URLs of the attachments that made it
    pub fn public_urls(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|f| f.relocated_url.clone())
            .collect()
    }
}

/// Media relocation service
pub struct MediaRelocator<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MediaRelocator<'a> {
    /// Create a new MediaRelocator
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Relocate every attachment of a broadcast.
    ///
    /// Failures are recorded per file and never abort the others.
    #[instrument(skip(self, attachments), fields(count = attachments.len()))]
    pub async fn relocate(&self, message_id: Uuid, attachments: &[Attachment]) -> RelocationReport {
        let stamp = Utc::now().timestamp_millis();

        let files = join_all(
            attachments
                .iter()
                .enumerate()
                .map(|(index, attachment)| self.relocate_one(message_id, stamp, index, attachment)),
        )
        .await;

        let report = RelocationReport { files };
        info!(
            processed = report.processed(),
            failed = report.failed(),
            "Media relocated"
        );
        report
    }

    async fn relocate_one(
        &self,
        message_id: Uuid,
        stamp: i64,
        index: usize,
        attachment: &Attachment,
    ) -> MediaFile {
        let position = i32::try_from(index).unwrap_or(i32::MAX);
        let declared = attachment.content_type.as_deref();

        let fetched = match tokio::time::timeout(
            self.ctx.relay().download_timeout(),
            self.ctx.media_fetcher().fetch(&attachment.url),
        )
        .await
        {
            Ok(Ok(fetched)) => fetched,
            Ok(Err(e)) => return self.failed(message_id, position, attachment, declared, &e),
            Err(_) => {
                let e = ProviderError::Timeout(self.ctx.relay().download_timeout_secs);
                return self.failed(message_id, position, attachment, declared, &e);
            }
        };

        let mime = declared
            .or(fetched.content_type.as_deref())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let size = i64::try_from(fetched.bytes.len()).unwrap_or(i64::MAX);
        let hash = hex::encode(blake3::hash(&fetched.bytes).as_bytes());
        let key = format!("media/{stamp}_{index}.{}", extension_for(&mime));

        match self.ctx.object_store().put(&key, fetched.bytes, &mime).await {
            Ok(url) => MediaFile::uploaded(
                message_id,
                position,
                attachment.url.clone(),
                url,
                mime,
                size,
                hash,
            ),
            Err(e) => self.failed(message_id, position, attachment, Some(&mime), &e),
        }
    }

    fn failed(
        &self,
        message_id: Uuid,
        position: i32,
        attachment: &Attachment,
        mime: Option<&str>,
        error: &ProviderError,
    ) -> MediaFile {
        warn!(position, error = %error, "Attachment relocation failed");
        MediaFile::failed(
            message_id,
            position,
            attachment.url.clone(),
            mime.unwrap_or(FALLBACK_MIME),
            error.to_string(),
        )
    }
}

/// File extension for a MIME type, `bin` when unknown
pub fn extension_for(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/bmp" => "bmp",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/3gpp" => "3gp",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/amr" => "amr",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        "text/vcard" | "text/x-vcard" => "vcf",
        "text/plain" => "txt",
        _ => "bin",
    }
}
