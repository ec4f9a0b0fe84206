//! Webhook request DTOs
//!
//! The carrier posts `application/x-www-form-urlencoded` bodies with
//! PascalCase keys. Attachments arrive as `NumMedia` plus numbered
//! `MediaUrl{i}` / `MediaContentType{i}` pairs, so they are read from a
//! key-value map rather than derived.

use std::collections::HashMap;

use serde::Serialize;

use crate::services::{ServiceError, ServiceResult};

/// The carrier attaches at most ten media files to one MMS
pub const MAX_MEDIA: usize = 10;

/// One sender attachment as announced by the carrier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub url: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn new(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Inbound SMS/MMS webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundSms {
    pub from: String,
    pub body: String,
    pub media: Vec<Attachment>,
    pub account_sid: Option<String>,
    pub message_sid: Option<String>,
}

impl InboundSms {
    /// Plain text message
    pub fn text(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            body: body.into(),
            media: Vec::new(),
            account_sid: None,
            message_sid: None,
        }
    }

    pub fn with_media(mut self, media: Vec<Attachment>) -> Self {
        self.media = media;
        self
    }

    /// Parse the webhook form
    ///
    /// # Errors
    /// `From` is required. A `NumMedia` that is not a number is rejected;
    /// announced attachments without a URL are skipped. At most
    /// [`MAX_MEDIA`] attachments are read.
    pub fn from_form(form: &HashMap<String, String>) -> ServiceResult<Self> {
        let from = form
            .get("From")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::validation("From is required"))?;

        let num_media = match form.get("NumMedia").map(|s| s.trim()) {
            None | Some("") => 0,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ServiceError::validation(format!("Invalid NumMedia: {raw}")))?,
        };

        let media = (0..num_media.min(MAX_MEDIA))
            .filter_map(|i| {
                let url = form.get(&format!("MediaUrl{i}"))?.trim();
                if url.is_empty() {
                    return None;
                }
                let content_type = form
                    .get(&format!("MediaContentType{i}"))
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty());
                Some(Attachment::new(url, content_type))
            })
            .collect();

        Ok(Self {
            from,
            body: form.get("Body").cloned().unwrap_or_default(),
            media,
            account_sid: non_empty(form, "AccountSid"),
            message_sid: non_empty(form, "MessageSid"),
        })
    }
}

/// Delivery status callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCallback {
    pub message_sid: String,
    pub message_status: String,
    pub error_code: Option<String>,
}

impl StatusCallback {
    /// Parse the callback form
    pub fn from_form(form: &HashMap<String, String>) -> ServiceResult<Self> {
        let message_sid = non_empty(form, "MessageSid")
            .ok_or_else(|| ServiceError::validation("MessageSid is required"))?;
        let message_status = non_empty(form, "MessageStatus")
            .or_else(|| non_empty(form, "SmsStatus"))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            message_sid,
            message_status,
            error_code: non_empty(form, "ErrorCode"),
        })
    }

    /// True for terminal failure states reported by the carrier
    pub fn is_failure(&self) -> bool {
        matches!(self.message_status.as_str(), "failed" | "undelivered")
    }
}

fn non_empty(form: &HashMap<String, String>, key: &str) -> Option<String> {
    form.get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
