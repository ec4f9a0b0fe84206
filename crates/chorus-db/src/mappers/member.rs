//! Member entity <-> model mapper

use std::collections::HashMap;

use chorus_core::entities::Member;
use chorus_core::value_objects::PhoneNumber;
use uuid::Uuid;

use crate::models::{MemberGroupModel, MemberModel};

impl From<MemberModel> for Member {
    fn from(model: MemberModel) -> Self {
        Member {
            id: model.id,
            phone_number: PhoneNumber::from_stored(model.phone_number),
            name: model.name,
            is_admin: model.is_admin,
            active: model.active,
            message_count: model.message_count,
            last_activity: model.last_activity,
            group_ids: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Attach group tags to a batch of member rows
pub fn member_with_groups(
    members: Vec<MemberModel>,
    memberships: Vec<MemberGroupModel>,
) -> Vec<Member> {
    let mut by_member: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in memberships {
        by_member.entry(row.member_id).or_default().push(row.group_id);
    }

    members
        .into_iter()
        .map(|model| {
            let groups = by_member.remove(&model.id).unwrap_or_default();
            let mut member = Member::from(model);
            member.group_ids = groups;
            member
        })
        .collect()
}
