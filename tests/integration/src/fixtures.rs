//! Test fixtures and data generators
//!
//! Builders for the carrier's form-encoded webhook bodies.

use crate::helpers::TEST_ACCOUNT_SID;

/// Congregation used by most scenarios: one admin and four members
pub const PASTOR: (&str, &str) = ("+12065550001", "Pastor Ray");
pub const MEMBERS: [(&str, &str); 4] = [
    ("+14255551111", "Jane Doe"),
    ("+14255552222", "Ann Lee"),
    ("+14255553333", "Bo Park"),
    ("+14255554444", "Cy Diaz"),
];

/// Inbound SMS/MMS webhook body
#[derive(Debug, Clone)]
pub struct InboundForm {
    pub from: String,
    pub body: String,
    pub media: Vec<(String, String)>,
}

impl InboundForm {
    pub fn text(from: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            body: body.to_string(),
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, url: &str, content_type: &str) -> Self {
        self.media.push((url.to_string(), content_type.to_string()));
        self
    }

    /// Key-value pairs as the carrier posts them
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("From".to_string(), self.from.clone()),
            ("To".to_string(), "+12065550000".to_string()),
            ("Body".to_string(), self.body.clone()),
            ("AccountSid".to_string(), TEST_ACCOUNT_SID.to_string()),
            ("MessageSid".to_string(), "SMinbound".to_string()),
            ("NumMedia".to_string(), self.media.len().to_string()),
        ];
        for (i, (url, content_type)) in self.media.iter().enumerate() {
            pairs.push((format!("MediaUrl{i}"), url.clone()));
            pairs.push((format!("MediaContentType{i}"), content_type.clone()));
        }
        pairs
    }
}

/// Delivery status callback body
pub fn status_callback(sid: &str, status: &str) -> Vec<(String, String)> {
    vec![
        ("MessageSid".to_string(), sid.to_string()),
        ("MessageStatus".to_string(), status.to_string()),
        ("AccountSid".to_string(), TEST_ACCOUNT_SID.to_string()),
    ]
}
