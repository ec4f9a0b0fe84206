//! Inbound message routing
//!
//! Entry point for one webhook delivery: identify the sender, then either run
//! an admin command or broadcast. Any reply is texted back to the sender.

use tracing::{error, info, instrument, warn};

use chorus_core::commands::Command;
use chorus_core::traits::OutboundSms;
use chorus_core::value_objects::PhoneNumber;

use crate::dto::InboundSms;

use super::broadcast::BroadcastService;
use super::commands::CommandDispatcher;
use super::context::ServiceContext;
use super::directory::MemberDirectory;
use super::sender::OutboundSender;

pub const UNREGISTERED_REPLY: &str =
    "This number isn't registered with the church text line. Please ask an admin to add you.";

pub const RETRY_REPLY: &str = "Sorry, your message could not be sent. Please try again later.";

/// Inbound router
pub struct InboundRouter<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InboundRouter<'a> {
    /// Create a new InboundRouter
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Process one inbound message and return the reply sent to the sender, if any
    #[instrument(skip_all, fields(message_sid = inbound.message_sid.as_deref().unwrap_or("-")))]
    pub async fn handle(&self, inbound: &InboundSms) -> Option<String> {
        let reply = self.route(inbound).await;

        if let Some(text) = &reply {
            let to = PhoneNumber::parse(&inbound.from);
            let outcome = OutboundSender::new(self.ctx)
                .send(&OutboundSms::text(to, text.as_str()))
                .await;
            if !outcome.is_sent() {
                warn!(attempts = outcome.attempts(), "Reply to sender was not delivered");
            }
        }
        reply
    }

    async fn route(&self, inbound: &InboundSms) -> Option<String> {
        let sender = match MemberDirectory::new(self.ctx)
            .find_by_phone(&inbound.from)
            .await
        {
            Ok(Some(member)) => member,
            Ok(None) => {
                info!(from = %PhoneNumber::parse(&inbound.from).tail(), "Message from unregistered sender rejected");
                return Some(UNREGISTERED_REPLY.to_string());
            }
            Err(e) => {
                error!(error = %e, "Sender lookup failed");
                return Some(RETRY_REPLY.to_string());
            }
        };

        if let Some(parsed) = Command::parse(&inbound.body) {
            let reply = CommandDispatcher::new(self.ctx).dispatch(&sender, parsed).await;
            return Some(reply);
        }

        match BroadcastService::new(self.ctx)
            .broadcast(&sender, &inbound.body, &inbound.media)
            .await
        {
            Ok(report) if sender.is_admin => Some(report.summary()),
            Ok(_) => None,
            Err(e) => {
                error!(error = %e, "Broadcast failed");
                if sender.is_admin {
                    Some(e.reply_text())
                } else {
                    Some(RETRY_REPLY.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::Attachment;
    use crate::testing::TestHarness;
    use chorus_core::entities::DeliveryStatus;

    fn congregation(harness: &TestHarness) {
        harness.member("+14255551111", "Jane");
        harness.member("+12065550001", "Bob");
        harness.member("+12065550002", "Carol");
        harness.member("+12065550003", "Dave");
        harness.admin("+12065550004", "Pastor Ray");
    }

    #[tokio::test]
    async fn test_member_broadcast_without_confirmation() {
        let harness = TestHarness::new();
        congregation(&harness);

        let inbound = InboundSms::text("+14255551111", "Prayer meeting tonight");
        let reply = InboundRouter::new(&harness.ctx).handle(&inbound).await;

        assert!(reply.is_none());
        let messages = harness.store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].delivery_status, DeliveryStatus::Completed);
        assert_eq!(harness.store.logs().len(), 4);
        assert!(harness.sms.sent_to("+14255551111").is_empty());
    }

    #[tokio::test]
    async fn test_admin_gets_summary() {
        let harness = TestHarness::new();
        congregation(&harness);

        let inbound = InboundSms::text("(206) 555-0004", "Service starts at 10");
        let reply = InboundRouter::new(&harness.ctx).handle(&inbound).await;

        assert_eq!(reply.as_deref(), Some("Broadcast sent to 4 of 4 members."));
        let to_pastor = harness.sms.sent_to("+12065550004");
        assert_eq!(to_pastor.len(), 1);
        assert_eq!(to_pastor[0].body, "Broadcast sent to 4 of 4 members.");
    }

    #[tokio::test]
    async fn test_unregistered_sender_rejected() {
        let harness = TestHarness::new();
        congregation(&harness);

        for body in ["hello", "HELP"] {
            let inbound = InboundSms::text("+19995550000", body);
            let reply = InboundRouter::new(&harness.ctx).handle(&inbound).await;
            assert_eq!(reply.as_deref(), Some(UNREGISTERED_REPLY));
        }

        assert!(harness.store.messages().is_empty());
        assert_eq!(harness.sms.sent_to("+19995550000").len(), 2);
        assert_eq!(harness.sms.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_commands_are_not_broadcast() {
        let harness = TestHarness::new();
        congregation(&harness);

        let inbound = InboundSms::text("+12065550004", "ADD +12065551234 Jane Doe");
        let reply = InboundRouter::new(&harness.ctx).handle(&inbound).await;

        assert_eq!(reply.as_deref(), Some("Added Jane Doe (+12065551234)"));
        assert!(harness.store.messages().is_empty());
        assert_eq!(harness.sms.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_reply_depends_on_role() {
        let harness = TestHarness::new();
        congregation(&harness);
        harness.store.fail_listing(true);

        let router = InboundRouter::new(&harness.ctx);
        let member_reply = router
            .handle(&InboundSms::text("+14255551111", "hello"))
            .await;
        assert_eq!(member_reply.as_deref(), Some(RETRY_REPLY));

        let admin_reply = router
            .handle(&InboundSms::text("+12065550004", "hello"))
            .await
            .unwrap();
        assert!(admin_reply.contains("Broadcast failed"), "{admin_reply}");
    }

    #[tokio::test]
    async fn test_media_only_message() {
        let harness = TestHarness::new();
        congregation(&harness);
        harness.fetcher.serve("https://carrier/pic", b"pic", "image/jpeg");

        let inbound = InboundSms::text("+14255551111", "")
            .with_media(vec![Attachment::new("https://carrier/pic", Some("image/jpeg"))]);
        InboundRouter::new(&harness.ctx).handle(&inbound).await;

        let to_bob = harness.sms.sent_to("+12065550001");
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].media_urls.len(), 1);
    }
}
