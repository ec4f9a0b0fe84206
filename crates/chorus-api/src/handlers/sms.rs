//! Carrier webhook handlers
//!
//! The carrier expects a prompt 2xx with a TwiML body. Inbound messages are
//! acknowledged with an empty `<Response/>` and processed in a spawned task;
//! any reply to the sender goes out through the REST API, not the TwiML.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use chorus_service::dto::{InboundSms, StatusCallback};
use chorus_service::{InboundRouter, StatusService};
use tracing::{info, warn, Instrument};

use crate::state::AppState;

/// Acknowledgement body returned for every webhook delivery
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

/// Inbound SMS/MMS webhook
///
/// POST /sms/incoming
pub async fn incoming(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let inbound = match InboundSms::from_form(&form) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(error = %e, "Malformed inbound webhook ignored");
            return twiml();
        }
    };

    let expected_sid = &state.config().sms.account_sid;
    if let Some(sid) = &inbound.account_sid {
        if !expected_sid.is_empty() && sid != expected_sid {
            warn!(account_sid = %sid, "Inbound webhook for a different account");
        }
    }

    info!(
        media = inbound.media.len(),
        body_len = inbound.body.len(),
        "Inbound message accepted"
    );

    let ctx = state.shared_context();
    let span = tracing::info_span!("inbound_message");
    tokio::spawn(
        async move {
            InboundRouter::new(&ctx).handle(&inbound).await;
        }
        .instrument(span),
    );

    twiml()
}

/// Delivery status callback
///
/// POST /sms/status
pub async fn status_callback(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match StatusCallback::from_form(&form) {
        Ok(callback) => {
            if let Err(e) = StatusService::new(state.service_context())
                .record_status_callback(&callback)
                .await
            {
                warn!(error = %e, sid = %callback.message_sid, "Status callback not recorded");
            }
        }
        Err(e) => warn!(error = %e, "Malformed status callback ignored"),
    }

    twiml()
}

fn twiml() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}
