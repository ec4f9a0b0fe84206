//! Phone number - the canonical join key between members, messages, and logs
//!
//! Normalization rules (applied to the digits of the raw input):
//! - 10 digits: `+1` prepended (North American number without country code)
//! - 11 digits starting with `1`: `+` prepended
//! - more than 11 digits: `+` prepended as-is
//! - anything else: the raw input is kept unchanged and flagged as suspect
//!
//! Construction never fails. Normalizing an already canonical number yields
//! the same number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Normalized phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    value: String,
    suspect: bool,
}

impl PhoneNumber {
    /// Normalize a raw phone string
    pub fn parse(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        let canonical = match digits.len() {
            10 => Some(format!("+1{digits}")),
            11 if digits.starts_with('1') => Some(format!("+{digits}")),
            n if n > 11 => Some(format!("+{digits}")),
            _ => None,
        };

        match canonical {
            Some(value) => Self {
                value,
                suspect: false,
            },
            None => Self {
                value: raw.to_string(),
                suspect: true,
            },
        }
    }

    /// Wrap a value read from storage without normalizing it
    pub fn from_stored(value: String) -> Self {
        let suspect = Self::parse(&value).suspect;
        Self { value, suspect }
    }

    /// True when normalizing again would not change the value
    pub fn is_canonical(&self) -> bool {
        Self::parse(&self.value).value == self.value
    }

    /// The normalized string (or the untouched input when suspect)
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consume into the normalized string
    #[inline]
    pub fn into_inner(self) -> String {
        self.value
    }

    /// True when the input could not be brought into canonical form
    #[inline]
    pub fn is_suspect(&self) -> bool {
        self.suspect
    }

    /// Last four digits, for log lines that should not carry full numbers
    pub fn tail(&self) -> &str {
        match self.value.char_indices().rev().nth(3) {
            Some((idx, _)) => &self.value[idx..],
            None => &self.value,
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for PhoneNumber {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for PhoneNumber {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

// Deserializing always normalizes, so stored or posted numbers in any format
// end up comparable.
impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_digits_gets_country_code() {
        let phone = PhoneNumber::parse("2065551234");
        assert_eq!(phone.as_str(), "+12065551234");
        assert!(!phone.is_suspect());
    }

    #[test]
    fn test_formatted_inputs() {
        assert_eq!(PhoneNumber::parse("(206) 555-1234").as_str(), "+12065551234");
        assert_eq!(PhoneNumber::parse("206.555.1234").as_str(), "+12065551234");
        assert_eq!(PhoneNumber::parse("1-206-555-1234").as_str(), "+12065551234");
        assert_eq!(PhoneNumber::parse("+1 (425) 555-1111").as_str(), "+14255551111");
    }

    #[test]
    fn test_international_kept_as_is() {
        let phone = PhoneNumber::parse("+44 20 7946 0958");
        assert_eq!(phone.as_str(), "+442079460958");
        assert!(!phone.is_suspect());
    }

    #[test]
    fn test_eleven_digits_not_starting_with_one_is_suspect() {
        let phone = PhoneNumber::parse("22065551234");
        assert_eq!(phone.as_str(), "22065551234");
        assert!(phone.is_suspect());
    }

    #[test]
    fn test_short_input_is_returned_unchanged() {
        let phone = PhoneNumber::parse("555-1234");
        assert_eq!(phone.as_str(), "555-1234");
        assert!(phone.is_suspect());

        let empty = PhoneNumber::parse("");
        assert_eq!(empty.as_str(), "");
        assert!(empty.is_suspect());
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "2065551234",
            "12065551234",
            "+1 206 555 1234",
            "+442079460958",
            "555-1234",
            "not a number",
            "",
        ];
        for input in inputs {
            let once = PhoneNumber::parse(input);
            let twice = PhoneNumber::parse(once.as_str());
            assert_eq!(once, twice, "normalization not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_tail() {
        assert_eq!(PhoneNumber::parse("2065551234").tail(), "1234");
        assert_eq!(PhoneNumber::parse("12").tail(), "12");
    }

    #[test]
    fn test_stored_values_are_kept() {
        let legacy = PhoneNumber::from_stored("206-555-1234".to_string());
        assert_eq!(legacy.as_str(), "206-555-1234");
        assert!(!legacy.is_canonical());
        assert!(!legacy.is_suspect());

        let canonical = PhoneNumber::from_stored("+12065551234".to_string());
        assert!(canonical.is_canonical());
        assert!(PhoneNumber::from_stored("555".to_string()).is_suspect());
    }

    #[test]
    fn test_serde_normalizes() {
        let phone: PhoneNumber = serde_json::from_str("\"(425) 555-1111\"").unwrap();
        assert_eq!(phone.as_str(), "+14255551111");
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+14255551111\"");
    }
}
