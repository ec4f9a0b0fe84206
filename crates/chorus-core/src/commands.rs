//! Admin command parsing
//!
//! A message is a command when its first token is a known keyword
//! (case-insensitive) and the rest of the message fits that keyword's shape:
//!
//! - `HELP` and `CLEANUP` must be the whole message
//! - `WIPE` must be the whole message or be followed by `CONFIRM` alone
//! - `ADD`, `REMOVE`, `ADMIN`, `DEMOTE` need either no argument or a
//!   phone-shaped argument: only phone punctuation and at least ten digits.
//!   For `ADD` that is the second token; the others take the whole rest
//!
//! Everything else is an ordinary broadcast, so "Add 2 cups of rice to the
//! list" is relayed rather than rejected.

use crate::error::DomainError;
use crate::value_objects::PhoneNumber;

pub const USAGE_ADD: &str = "Usage: ADD +12065551234 Full Name";
pub const USAGE_REMOVE: &str = "Usage: REMOVE +12065551234";
pub const USAGE_ADMIN: &str = "Usage: ADMIN +12065551234";
pub const USAGE_DEMOTE: &str = "Usage: DEMOTE +12065551234";

/// Parsed admin command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Add { phone: PhoneNumber, name: String },
    Remove { phone: PhoneNumber },
    Admin { phone: PhoneNumber },
    Demote { phone: PhoneNumber },
    Wipe { confirmed: bool },
    Cleanup,
}

impl Command {
    /// Recognize a command.
    ///
    /// Returns `None` for ordinary text, `Some(Err(..))` for a recognized
    /// keyword with bad arguments (the error carries the usage line).
    pub fn parse(text: &str) -> Option<Result<Self, DomainError>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let (keyword, args) = tokens.split_first()?;
        let keyword = keyword.to_ascii_uppercase();

        match keyword.as_str() {
            "HELP" if args.is_empty() => Some(Ok(Self::Help)),
            "CLEANUP" if args.is_empty() => Some(Ok(Self::Cleanup)),
            "WIPE" => match args {
                [] => Some(Ok(Self::Wipe { confirmed: false })),
                [arg] if arg.eq_ignore_ascii_case("CONFIRM") => {
                    Some(Ok(Self::Wipe { confirmed: true }))
                }
                _ => None,
            },
            "ADD" => match args.first() {
                Some(phone) if !looks_like_phone(phone) => None,
                _ => Some(parse_roster_command(&keyword, args)),
            },
            "REMOVE" | "ADMIN" | "DEMOTE" => {
                if !args.is_empty() && !looks_like_phone(&args.join(" ")) {
                    return None;
                }
                Some(parse_roster_command(&keyword, args))
            }
            _ => None,
        }
    }

    /// Keyword, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Add { .. } => "ADD",
            Self::Remove { .. } => "REMOVE",
            Self::Admin { .. } => "ADMIN",
            Self::Demote { .. } => "DEMOTE",
            Self::Wipe { .. } => "WIPE",
            Self::Cleanup => "CLEANUP",
        }
    }

    /// Everything except HELP is admin-only
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Self::Help)
    }
}

fn looks_like_phone(raw: &str) -> bool {
    let phone_chars = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' '));
    phone_chars && raw.chars().filter(char::is_ascii_digit).count() >= 10
}

fn parse_roster_command(keyword: &str, args: &[&str]) -> Result<Command, DomainError> {
    if keyword == "ADD" {
        let [phone, name @ ..] = args else {
            return Err(DomainError::validation(USAGE_ADD));
        };
        if name.is_empty() {
            return Err(DomainError::validation(USAGE_ADD));
        }
        let phone = parse_phone(phone, USAGE_ADD)?;
        return Ok(Command::Add {
            phone,
            name: name.join(" "),
        });
    }

    let usage = match keyword {
        "REMOVE" => USAGE_REMOVE,
        "ADMIN" => USAGE_ADMIN,
        _ => USAGE_DEMOTE,
    };
    if args.is_empty() {
        return Err(DomainError::validation(usage));
    }
    // "REMOVE +1 206 555 1234" is one phone split by spaces
    let phone = parse_phone(&args.join(" "), usage)?;

    Ok(match keyword {
        "REMOVE" => Command::Remove { phone },
        "ADMIN" => Command::Admin { phone },
        _ => Command::Demote { phone },
    })
}

fn parse_phone(raw: &str, usage: &str) -> Result<PhoneNumber, DomainError> {
    let phone = PhoneNumber::parse(raw);
    if phone.is_suspect() {
        return Err(DomainError::validation(format!(
            "Invalid phone number: {raw}\n{usage}"
        )));
    }
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> Command {
        Command::parse(text)
            .expect("expected a command")
            .expect("expected valid arguments")
    }

    #[test]
    fn test_help_is_case_insensitive() {
        assert_eq!(parse_ok("help"), Command::Help);
        assert_eq!(parse_ok("  HeLp  "), Command::Help);
    }

    #[test]
    fn test_help_inside_sentence_is_broadcast() {
        assert!(Command::parse("Help needed moving tables Saturday").is_none());
    }

    #[test]
    fn test_add() {
        assert_eq!(
            parse_ok("ADD +12065551234 Jane"),
            Command::Add {
                phone: PhoneNumber::parse("+12065551234"),
                name: "Jane".to_string(),
            }
        );
        assert_eq!(
            parse_ok("add 2065551234 Mary Ann Smith"),
            Command::Add {
                phone: PhoneNumber::parse("+12065551234"),
                name: "Mary Ann Smith".to_string(),
            }
        );
    }

    #[test]
    fn test_add_missing_name_is_usage_error() {
        let err = Command::parse("ADD +12065551234").unwrap().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), USAGE_ADD);

        let err = Command::parse("ADD").unwrap().unwrap_err();
        assert_eq!(err.to_string(), USAGE_ADD);
    }

    #[test]
    fn test_add_with_bad_phone() {
        let err = Command::parse("ADD 20655512345 Jane").unwrap().unwrap_err();
        assert!(err.to_string().starts_with("Invalid phone number: 20655512345"));
    }

    #[test]
    fn test_ordinary_text_starting_with_keyword() {
        assert!(Command::parse("Add chairs to the fellowship hall").is_none());
        assert!(Command::parse("Remove your shoes at the door").is_none());
        assert!(Command::parse("Cleanup crew meets at 9").is_none());
    }

    #[test]
    fn test_short_numbers_are_not_phones() {
        assert!(Command::parse("Add 2 cups of rice to the list").is_none());
        assert!(Command::parse("ADD 555 Jane").is_none());
        assert!(Command::parse("Remove 3 chairs from row 12").is_none());
        assert!(Command::parse("Admin 2 meeting moved").is_none());
        assert!(Command::parse("Demote 4 1 2").is_none());
    }

    #[test]
    fn test_remove_admin_demote() {
        assert_eq!(
            parse_ok("remove +1 206 555 1234"),
            Command::Remove {
                phone: PhoneNumber::parse("+12065551234")
            }
        );
        assert_eq!(
            parse_ok("ADMIN (206) 555-1234"),
            Command::Admin {
                phone: PhoneNumber::parse("+12065551234")
            }
        );
        assert_eq!(
            parse_ok("Demote 2065551234"),
            Command::Demote {
                phone: PhoneNumber::parse("+12065551234")
            }
        );
    }

    #[test]
    fn test_bare_roster_keyword_needs_arguments() {
        let err = Command::parse("REMOVE").unwrap().unwrap_err();
        assert_eq!(err.to_string(), USAGE_REMOVE);
        let err = Command::parse("demote").unwrap().unwrap_err();
        assert_eq!(err.to_string(), USAGE_DEMOTE);
    }

    #[test]
    fn test_wipe_confirmation() {
        assert_eq!(parse_ok("WIPE"), Command::Wipe { confirmed: false });
        assert_eq!(parse_ok("wipe confirm"), Command::Wipe { confirmed: true });
        assert_eq!(parse_ok("  Wipe   CONFIRM "), Command::Wipe { confirmed: true });
    }

    #[test]
    fn test_wipe_inside_sentence_is_broadcast() {
        assert!(Command::parse("Wipe down the tables after lunch").is_none());
        assert!(Command::parse("WIPE now").is_none());
        assert!(Command::parse("wipe confirm please").is_none());
    }

    #[test]
    fn test_cleanup() {
        assert_eq!(parse_ok("CLEANUP"), Command::Cleanup);
        assert!(Command::parse("cleanup please").is_none());
    }

    #[test]
    fn test_requires_admin() {
        assert!(!Command::Help.requires_admin());
        assert!(Command::Cleanup.requires_admin());
        assert!(Command::Wipe { confirmed: false }.requires_admin());
    }

    #[test]
    fn test_empty_text() {
        assert!(Command::parse("").is_none());
        assert!(Command::parse("   ").is_none());
    }
}
