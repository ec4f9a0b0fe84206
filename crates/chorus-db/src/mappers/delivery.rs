//! Delivery log entity <-> model mapper

use chorus_core::entities::{DeliveryLog, DeliveryOutcome};
use chorus_core::value_objects::PhoneNumber;

use crate::models::DeliveryLogModel;

impl From<DeliveryLogModel> for DeliveryLog {
    fn from(model: DeliveryLogModel) -> Self {
        DeliveryLog {
            id: model.id,
            message_id: model.message_id,
            member_id: model.member_id,
            to_phone: PhoneNumber::from_stored(model.to_phone),
            status: DeliveryOutcome::from(model.status.as_str()),
            provider_message_id: model.provider_message_id,
            error_message: model.error_message,
            delivery_time_ms: model.delivery_time_ms,
            created_at: model.created_at,
        }
    }
}
