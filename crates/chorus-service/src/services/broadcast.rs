//! Broadcast orchestration
//!
//! One inbound message from a registered member becomes one
//! `BroadcastMessage`, relocated media, and one delivery log per active
//! recipient. The message row is written in `processing` before any send
//! goes out and is only moved to `completed` once every recipient has a log.

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use chorus_core::entities::{
    BroadcastMessage, DeliveryLog, DeliveryStatus, Member, ProcessingStatus,
};
use chorus_core::traits::OutboundSms;
use chorus_core::DomainError;

use crate::dto::Attachment;

use super::context::ServiceContext;
use super::directory::MemberDirectory;
use super::error::ServiceResult;
use super::media::{MediaRelocator, RelocationReport};
use super::sender::{OutboundSender, SendOutcome};

/// Outcome of one broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub message_id: Uuid,
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
    pub media_processed: usize,
    pub media_failed: usize,
}

impl BroadcastReport {
    /// Delivery summary texted back to admin senders
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Broadcast sent to {} of {} members",
            self.sent, self.recipients
        );
        if self.failed > 0 {
            summary.push_str(&format!(" ({} failed)", self.failed));
        }
        summary.push('.');

        let attachments = self.media_processed + self.media_failed;
        if attachments > 0 {
            summary.push_str(&format!(
                " Media: {} of {attachments} attachments relocated.",
                self.media_processed
            ));
        }
        summary
    }
}

/// Broadcast orchestrator
pub struct BroadcastService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BroadcastService<'a> {
    /// Create a new BroadcastService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Relay `text` and `attachments` from `sender` to every other active member
    #[instrument(skip(self, sender, text, attachments), fields(from = %sender.phone_number.tail(), media = attachments.len()))]
    pub async fn broadcast(
        &self,
        sender: &Member,
        text: &str,
        attachments: &[Attachment],
    ) -> ServiceResult<BroadcastReport> {
        let body = if text.trim().is_empty() && attachments.is_empty() {
            self.ctx.relay().empty_placeholder.as_str()
        } else {
            text.trim()
        };
        let from_name = sender.display_name();
        let processed_text = if body.is_empty() {
            format!("{from_name} sent media")
        } else {
            format!("{from_name}: {body}")
        };

        let mut message = BroadcastMessage::new(
            sender.phone_number.clone(),
            from_name,
            text,
            processed_text,
            attachments.len(),
        );

        let relocation = if attachments.is_empty() {
            RelocationReport::default()
        } else {
            let report = MediaRelocator::new(self.ctx)
                .relocate(message.id, attachments)
                .await;
            message.processing_status = if report.processed() > 0 {
                ProcessingStatus::Completed
            } else {
                ProcessingStatus::Failed
            };
            report
        };

        self.ctx.message_repo().create(&message).await?;
        for file in &relocation.files {
            // the relocated URL still travels with the broadcast
            if let Err(e) = self.ctx.media_repo().create(file).await {
                error!(message_id = %message.id, position = file.position, error = %e, "Failed to record media file");
            }
        }

        let directory = MemberDirectory::new(self.ctx);
        if let Err(e) = directory.record_activity(sender.id).await {
            warn!(error = %e, "Failed to record sender activity");
        }

        let recipients = match directory.list_active(Some(&sender.phone_number)).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Recipient listing failed");
                self.mark_delivery(message.id, DeliveryStatus::Failed).await;
                return Err(DomainError::OrchestrationFailure(e.to_string()).into());
            }
        };

        let media_urls = relocation.public_urls();
        let (sent, unlogged) = self.fan_out(&message, &recipients, &media_urls).await;

        let status = if unlogged == 0 {
            DeliveryStatus::Completed
        } else {
            DeliveryStatus::Failed
        };
        self.mark_delivery(message.id, status).await;

        let report = BroadcastReport {
            message_id: message.id,
            recipients: recipients.len(),
            sent,
            failed: recipients.len() - sent,
            media_processed: relocation.processed(),
            media_failed: relocation.failed(),
        };
        info!(
            message_id = %report.message_id,
            recipients = report.recipients,
            sent = report.sent,
            failed = report.failed,
            "Broadcast finished"
        );
        Ok(report)
    }

    /// Send to every recipient concurrently and log each result.
    /// Returns (sent, log rows that could not be written).
    async fn fan_out(
        &self,
        message: &BroadcastMessage,
        recipients: &[Member],
        media_urls: &[String],
    ) -> (usize, usize) {
        let sender = OutboundSender::new(self.ctx);
        let message_id = message.id;

        let deliveries = recipients.iter().map(|recipient| {
            let sms = OutboundSms::text(recipient.phone_number.clone(), &message.processed_text)
                .with_media(media_urls.to_vec());
            let sender = &sender;
            async move {
                let outcome = sender.send(&sms).await;
                let log = match &outcome {
                    SendOutcome::Sent {
                        provider_id,
                        elapsed_ms,
                        ..
                    } => DeliveryLog::sent(
                        message_id,
                        recipient.id,
                        recipient.phone_number.clone(),
                        provider_id.clone(),
                        *elapsed_ms,
                    ),
                    SendOutcome::Failed {
                        error, elapsed_ms, ..
                    } => DeliveryLog::failed(
                        message_id,
                        recipient.id,
                        recipient.phone_number.clone(),
                        error.clone(),
                        *elapsed_ms,
                    ),
                };
                let logged = match self.ctx.delivery_log_repo().create(&log).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(%message_id, member_id = %recipient.id, error = %e, "Failed to write delivery log");
                        false
                    }
                };
                (outcome.is_sent(), logged)
            }
        });

        join_all(deliveries)
            .await
            .into_iter()
            .fold((0, 0), |(sent, unlogged), (ok, logged)| {
                (sent + usize::from(ok), unlogged + usize::from(!logged))
            })
    }

    async fn mark_delivery(&self, message_id: Uuid, status: DeliveryStatus) {
        if let Err(e) = self
            .ctx
            .message_repo()
            .update_delivery_status(message_id, status)
            .await
        {
            error!(%message_id, status = status.as_str(), error = %e, "Failed to update delivery status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use chorus_core::entities::DeliveryOutcome;
    use chorus_core::ProviderError;
    use std::time::Duration;

    fn congregation(harness: &TestHarness) -> Member {
        let jane = harness.member("+14255551111", "Jane");
        harness.member("+12065550001", "Bob");
        harness.member("+12065550002", "Carol");
        harness.member("+12065550003", "Dave");
        harness.admin("+12065550004", "Pastor Ray");
        jane
    }

    #[tokio::test]
    async fn test_broadcast_to_all_active_members() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);

        let report = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "Prayer meeting tonight", &[])
            .await
            .unwrap();

        assert_eq!(report.recipients, 4);
        assert_eq!(report.sent, 4);

        let messages = harness.store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].processed_text, "Jane: Prayer meeting tonight");
        assert_eq!(messages[0].original_text, "Prayer meeting tonight");
        assert_eq!(messages[0].delivery_status, DeliveryStatus::Completed);
        assert_eq!(harness.store.logs().len(), 4);

        assert!(harness.sms.sent_to("+14255551111").is_empty());
        let to_bob = harness.sms.sent_to("+12065550001");
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].body, "Jane: Prayer meeting tonight");

        let jane = harness.store.member_by_phone("+14255551111").unwrap();
        assert_eq!(jane.message_count, 1);
        assert!(jane.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_failed_sends_still_logged() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        harness.sms.always_fail("+12065550002");

        let report = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "Choir practice moved", &[])
            .await
            .unwrap();

        assert_eq!(report.sent, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.summary(), "Broadcast sent to 3 of 4 members (1 failed).");

        let logs = harness.store.logs();
        assert_eq!(logs.len(), 4);
        let failed: Vec<_> = logs
            .iter()
            .filter(|l| l.status == DeliveryOutcome::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].to_phone.as_str(), "+12065550002");
        assert!(failed[0].error_message.is_some());
        assert_eq!(harness.store.messages()[0].delivery_status, DeliveryStatus::Completed);
    }

    #[tokio::test]
    async fn test_inactive_members_are_skipped() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        let mut away = Member::new("+12065559999".into(), "Away");
        away.active = false;
        harness.store.insert_member(away);

        let report = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "hello", &[])
            .await
            .unwrap();
        assert_eq!(report.recipients, 4);
        assert!(harness.sms.sent_to("+12065559999").is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_gets_placeholder() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);

        BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "   ", &[])
            .await
            .unwrap();

        assert_eq!(
            harness.store.messages()[0].processed_text,
            "Jane: [empty message]"
        );
    }

    #[tokio::test]
    async fn test_media_with_partial_failure() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        harness.fetcher.serve("https://carrier/1", b"one", "image/jpeg");
        harness.fetcher.fail("https://carrier/2", ProviderError::transport("reset"));
        harness.fetcher.serve("https://carrier/3", b"three", "image/png");

        let attachments = vec![
            Attachment::new("https://carrier/1", Some("image/jpeg")),
            Attachment::new("https://carrier/2", Some("image/jpeg")),
            Attachment::new("https://carrier/3", Some("image/png")),
        ];
        let report = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "", &attachments)
            .await
            .unwrap();

        assert_eq!(report.media_processed, 2);
        assert_eq!(report.media_failed, 1);

        let message = &harness.store.messages()[0];
        assert_eq!(message.media_count, 3);
        assert!(message.has_media);
        assert_eq!(message.processed_text, "Jane sent media");
        assert_eq!(message.processing_status, ProcessingStatus::Completed);
        assert_eq!(message.delivery_status, DeliveryStatus::Completed);

        let media = harness.store.media();
        assert_eq!(media.len(), 3);
        assert_eq!(media.iter().filter(|m| m.relocated_url.is_some()).count(), 2);

        let to_bob = harness.sms.sent_to("+12065550001");
        assert_eq!(to_bob[0].media_urls.len(), 2);
        assert!(to_bob[0].media_urls.iter().all(|u| u.starts_with("https://media.test/media/")));
    }

    #[tokio::test]
    async fn test_listing_failure_marks_broadcast_failed() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        harness.store.fail_listing(true);

        let err = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "hello", &[])
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "ORCHESTRATION_FAILURE");
        let messages = harness.store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].delivery_status, DeliveryStatus::Failed);
        assert!(harness.store.logs().is_empty());
        assert!(harness.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_media_record_failure_does_not_stop_broadcast() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        harness.fetcher.serve("https://carrier/1", b"one", "image/jpeg");
        harness.store.fail_media_insert(true);

        let report = BroadcastService::new(&harness.ctx)
            .broadcast(
                &jane,
                "Retreat photo",
                &[Attachment::new("https://carrier/1", Some("image/jpeg"))],
            )
            .await
            .unwrap();

        assert_eq!(report.sent, 4);
        assert_eq!(report.media_processed, 1);
        assert!(harness.store.media().is_empty());

        let message = &harness.store.messages()[0];
        assert_eq!(message.delivery_status, DeliveryStatus::Completed);
        assert_eq!(harness.store.logs().len(), 4);
        assert_eq!(harness.sms.sent_to("+12065550001")[0].media_urls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_recipient_does_not_block_others() {
        let harness = TestHarness::new();
        let jane = congregation(&harness);
        harness.sms.delay("+12065550002", Duration::from_secs(5));

        let ctx = harness.ctx.clone();
        let task = tokio::spawn(async move {
            BroadcastService::new(&ctx)
                .broadcast(&jane, "Doors open at 6", &[])
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let logged: Vec<_> = harness
            .store
            .logs()
            .into_iter()
            .map(|l| l.to_phone.as_str().to_string())
            .collect();
        assert_eq!(logged.len(), 3);
        assert!(!logged.contains(&"+12065550002".to_string()));
        assert_eq!(
            harness.store.messages()[0].delivery_status,
            DeliveryStatus::Processing
        );

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.sent, 4);
        assert_eq!(harness.store.logs().len(), 4);
        assert_eq!(harness.store.messages()[0].delivery_status, DeliveryStatus::Completed);
    }

    #[tokio::test]
    async fn test_sole_member_broadcasts_to_nobody() {
        let harness = TestHarness::new();
        let jane = harness.member("+14255551111", "Jane");

        let report = BroadcastService::new(&harness.ctx)
            .broadcast(&jane, "anyone?", &[])
            .await
            .unwrap();
        assert_eq!(report.recipients, 0);
        assert_eq!(harness.store.messages()[0].delivery_status, DeliveryStatus::Completed);
    }

    #[test]
    fn test_summary_mentions_media() {
        let report = BroadcastReport {
            message_id: Uuid::nil(),
            recipients: 4,
            sent: 4,
            failed: 0,
            media_processed: 2,
            media_failed: 1,
        };
        assert_eq!(
            report.summary(),
            "Broadcast sent to 4 of 4 members. Media: 2 of 3 attachments relocated."
        );
    }
}
