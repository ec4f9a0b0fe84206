//! Roster seeding
//!
//! Imports groups and members from a JSON roster at startup. Seeding only
//! adds: existing groups and members are left as they are, so the same file
//! can be applied on every boot.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use chorus_core::entities::{Group, NewMember};
use chorus_core::value_objects::PhoneNumber;

use super::context::ServiceContext;
use super::directory::MemberDirectory;
use super::error::{ServiceError, ServiceResult};

/// Roster file contents
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RosterFile {
    #[serde(default)]
    #[validate(nested)]
    pub groups: Vec<SeedGroup>,

    #[serde(default)]
    #[validate(nested)]
    pub members: Vec<SeedMember>,
}

impl RosterFile {
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ServiceError::validation(format!("Invalid roster file: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeedGroup {
    #[validate(length(min = 1, max = 64, message = "Group name must be 1-64 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeedMember {
    #[validate(length(min = 1, message = "Member phone is required"))]
    pub phone: String,

    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub groups: Vec<String>,
}

/// What a seeding run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub groups_created: usize,
    pub members_created: usize,
    pub members_skipped: usize,
    pub invalid_phones: usize,
    pub memberships_added: usize,
}

/// Roster seeder
pub struct RosterSeeder<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RosterSeeder<'a> {
    /// Create a new RosterSeeder
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Read and apply a roster file
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn seed_file(&self, path: impl AsRef<Path>) -> ServiceResult<SeedReport> {
        let json = tokio::fs::read_to_string(path.as_ref()).await.map_err(|e| {
            ServiceError::internal(format!(
                "Cannot read roster file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        self.seed(RosterFile::from_json(&json)?).await
    }

    /// Apply a parsed roster
    pub async fn seed(&self, roster: RosterFile) -> ServiceResult<SeedReport> {
        roster.validate()?;
        let mut report = SeedReport::default();
        let groups = self.ctx.group_repo();

        let mut by_name: HashMap<String, Group> = HashMap::new();
        for seed in roster.groups {
            let group = match groups.find_by_name(&seed.name).await? {
                Some(existing) => existing,
                None => {
                    let group = Group::new(seed.name.trim(), seed.description);
                    groups.create(&group).await?;
                    report.groups_created += 1;
                    group
                }
            };
            by_name.insert(group.name.to_lowercase(), group);
        }

        let directory = MemberDirectory::new(self.ctx);
        for seed in roster.members {
            let phone = PhoneNumber::parse(&seed.phone);
            if phone.is_suspect() {
                warn!(phone = %seed.phone, "Skipping roster entry with invalid phone");
                report.invalid_phones += 1;
                continue;
            }
            if directory.find_by_phone(phone.as_str()).await?.is_some() {
                report.members_skipped += 1;
                continue;
            }

            let mut data = NewMember::new(phone, seed.name);
            data.is_admin = seed.is_admin;
            let member = directory.create(data).await?;
            report.members_created += 1;

            for name in &seed.groups {
                let group = match by_name.get(&name.to_lowercase()) {
                    Some(group) => group.clone(),
                    None => match groups.find_by_name(name).await? {
                        Some(group) => {
                            by_name.insert(group.name.to_lowercase(), group.clone());
                            group
                        }
                        None => {
                            warn!(group = %name, member_id = %member.id, "Roster references unknown group");
                            continue;
                        }
                    },
                };
                groups.add_member(group.id, member.id).await?;
                report.memberships_added += 1;
            }
        }

        info!(?report, "Roster seeded");
        Ok(report)
    }
}
