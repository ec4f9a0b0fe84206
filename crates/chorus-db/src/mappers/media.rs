//! Media file entity <-> model mapper

use chorus_core::entities::{MediaFile, UploadStatus};

use crate::models::MediaFileModel;

impl From<MediaFileModel> for MediaFile {
    fn from(model: MediaFileModel) -> Self {
        MediaFile {
            id: model.id,
            message_id: model.message_id,
            position: model.position,
            original_url: model.original_url,
            relocated_url: model.relocated_url,
            mime_type: model.mime_type,
            size: model.size,
            hash: model.hash,
            upload_status: UploadStatus::from(model.upload_status.as_str()),
            error_message: model.error_message,
            created_at: model.created_at,
        }
    }
}
