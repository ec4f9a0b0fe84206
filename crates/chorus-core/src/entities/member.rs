//! Member entity - a registered phone on the broadcast roster

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::value_objects::PhoneNumber;

/// Member entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub phone_number: PhoneNumber,
    pub name: String,
    pub is_admin: bool,
    pub active: bool,
    pub message_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub group_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new active, non-admin member
    pub fn new(phone_number: PhoneNumber, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phone_number,
            name: name.into(),
            is_admin: false,
            active: true,
            message_count: 0,
            last_activity: None,
            group_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a member from validated creation data
    pub fn from_new(data: NewMember) -> Self {
        let mut member = Self::new(data.phone_number, data.name.trim());
        member.is_admin = data.is_admin;
        member
    }

    /// Name to show in relayed messages, falling back to the phone tail
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("...{}", self.phone_number.tail())
        } else {
            name.to_string()
        }
    }

    /// Register an inbound message from this member
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.message_count += 1;
        self.last_activity = Some(now);
        self.updated_at = now;
    }

    #[inline]
    pub fn in_group(&self, group_id: Uuid) -> bool {
        self.group_ids.contains(&group_id)
    }
}

/// Data required to register a member
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMember {
    pub phone_number: PhoneNumber,

    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    #[serde(default)]
    pub is_admin: bool,
}

impl NewMember {
    pub fn new(phone_number: PhoneNumber, name: impl Into<String>) -> Self {
        Self {
            phone_number,
            name: name.into(),
            is_admin: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_creation() {
        let member = Member::new(PhoneNumber::parse("2065551234"), "Jane");
        assert_eq!(member.phone_number.as_str(), "+12065551234");
        assert!(!member.is_admin);
        assert!(member.active);
        assert_eq!(member.message_count, 0);
        assert!(member.last_activity.is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut member = Member::new(PhoneNumber::parse("2065551234"), "  ");
        assert_eq!(member.display_name(), "...1234");

        member.name = "Jane Doe".to_string();
        assert_eq!(member.display_name(), "Jane Doe");
    }

    #[test]
    fn test_touch_counts_activity() {
        let mut member = Member::new(PhoneNumber::parse("2065551234"), "Jane");
        member.touch();
        member.touch();
        assert_eq!(member.message_count, 2);
        assert!(member.last_activity.is_some());
    }

    #[test]
    fn test_new_member_validation() {
        let ok = NewMember::new(PhoneNumber::parse("2065551234"), "Jane");
        assert!(ok.validate().is_ok());

        let empty = NewMember::new(PhoneNumber::parse("2065551234"), "");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_from_new_keeps_admin_flag() {
        let member = Member::from_new(NewMember::new(PhoneNumber::parse("2065551234"), " Pastor ").admin());
        assert!(member.is_admin);
        assert_eq!(member.name, "Pastor");
    }
}
