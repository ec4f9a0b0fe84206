//! Broadcast message entity <-> model mapper

use chorus_core::entities::{BroadcastMessage, DeliveryStatus, ProcessingStatus};
use chorus_core::value_objects::PhoneNumber;

use crate::models::BroadcastMessageModel;

impl From<BroadcastMessageModel> for BroadcastMessage {
    fn from(model: BroadcastMessageModel) -> Self {
        BroadcastMessage {
            id: model.id,
            from_phone: PhoneNumber::from_stored(model.from_phone),
            from_name: model.from_name,
            original_text: model.original_text,
            processed_text: model.processed_text,
            has_media: model.has_media,
            media_count: model.media_count,
            processing_status: ProcessingStatus::from(model.processing_status.as_str()),
            delivery_status: DeliveryStatus::from(model.delivery_status.as_str()),
            sent_at: model.sent_at,
        }
    }
}
