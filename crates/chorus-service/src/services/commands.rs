//! Admin command dispatch
//!
//! Every command ends in a reply string; errors are rendered for the sender
//! and never propagate further.

use tracing::{info, instrument, warn};

use chorus_core::commands::Command;
use chorus_core::entities::{Member, NewMember};
use chorus_core::traits::CleanupReport;
use chorus_core::DomainError;

use super::context::ServiceContext;
use super::directory::MemberDirectory;
use super::error::{ServiceError, ServiceResult};

const MEMBER_HELP: &str = "Text this number to share a message with everyone in the congregation. \
Pictures and videos are forwarded too.";

const ADMIN_HELP: &str = "Admin commands:\n\
ADD +12065551234 Full Name\n\
REMOVE +12065551234\n\
ADMIN +12065551234\n\
DEMOTE +12065551234\n\
CLEANUP\n\
WIPE CONFIRM (deletes everything)\n\
Any other text is broadcast to all members.";

const WIPE_WARNING: &str =
    "WIPE deletes every member and message. Reply WIPE CONFIRM to proceed.";

/// Admin command dispatcher
pub struct CommandDispatcher<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommandDispatcher<'a> {
    /// Create a new CommandDispatcher
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run a parsed command on behalf of `sender` and return the reply
    #[instrument(skip_all, fields(from = %sender.phone_number.tail()))]
    pub async fn dispatch(&self, sender: &Member, parsed: Result<Command, DomainError>) -> String {
        let directory = MemberDirectory::new(self.ctx);

        // admin rights may have changed since the sender was looked up
        let is_admin = match directory.find_by_phone(sender.phone_number.as_str()).await {
            Ok(Some(current)) => current.is_admin,
            Ok(None) => return ServiceError::from(DomainError::UnregisteredSender(
                sender.phone_number.to_string(),
            ))
            .reply_text(),
            Err(e) => return e.reply_text(),
        };

        let command = match parsed {
            Ok(command) => command,
            Err(e) if is_admin => return e.to_string(),
            Err(_) => return ServiceError::AdminRequired.reply_text(),
        };

        if command.requires_admin() && !is_admin {
            warn!(command = command.name(), "Admin command from non-admin");
            return ServiceError::AdminRequired.reply_text();
        }

        info!(command = command.name(), "Running command");
        match self.execute(sender, is_admin, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Command failed");
                e.reply_text()
            }
        }
    }

    async fn execute(&self, sender: &Member, is_admin: bool, command: Command) -> ServiceResult<String> {
        let directory = MemberDirectory::new(self.ctx);

        match command {
            Command::Help if is_admin => Ok(ADMIN_HELP.to_string()),
            Command::Help => Ok(MEMBER_HELP.to_string()),

            Command::Add { phone, name } => {
                let member = directory.create(NewMember::new(phone, name)).await?;
                Ok(format!("Added {} ({})", member.name, member.phone_number))
            }

            Command::Remove { phone } => {
                if phone == sender.phone_number {
                    return Err(ServiceError::validation("You cannot remove yourself."));
                }
                let (member, summary) = directory.purge(phone.as_str()).await?;
                Ok(format!(
                    "Removed {} ({}). Deleted {} messages and {} delivery logs.",
                    member.display_name(),
                    member.phone_number,
                    summary.messages,
                    summary.delivery_logs
                ))
            }

            Command::Admin { phone } => {
                let current = directory.require_member(phone.as_str()).await?;
                if current.is_admin {
                    return Ok(format!("{} is already an admin.", current.display_name()));
                }
                let member = directory.set_admin(phone.as_str(), true).await?;
                Ok(format!("{} is now an admin.", member.display_name()))
            }

            Command::Demote { phone } => {
                if phone == sender.phone_number {
                    return Err(ServiceError::validation("You cannot demote yourself."));
                }
                let current = directory.require_member(phone.as_str()).await?;
                if !current.is_admin {
                    return Ok(format!("{} is not an admin.", current.display_name()));
                }
                let member = directory.set_admin(phone.as_str(), false).await?;
                Ok(format!("{} is no longer an admin.", member.display_name()))
            }

            Command::Wipe { confirmed: false } => Ok(WIPE_WARNING.to_string()),
            Command::Wipe { confirmed: true } => {
                let summary = directory.wipe_all().await?;
                Ok(format!(
                    "Wiped {} members, {} groups, {} messages, {} media files and {} delivery logs.",
                    summary.members,
                    summary.groups,
                    summary.messages,
                    summary.media_files,
                    summary.delivery_logs
                ))
            }

            Command::Cleanup => Ok(cleanup_text(&directory.cleanup().await?)),
        }
    }
}

fn cleanup_text(report: &CleanupReport) -> String {
    if report.is_clean() {
        return "Cleanup complete. Nothing needed fixing.".to_string();
    }
    format!(
        "Cleanup complete. Merged {} duplicate members, fixed {} phone numbers, \
removed {} orphan media and {} orphan delivery logs, closed {} stale broadcasts.",
        report.duplicates_merged,
        report.phones_renormalized,
        report.orphan_media,
        report.orphan_logs,
        report.stale_broadcasts
    )
}
