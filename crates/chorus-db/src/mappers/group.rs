//! Group entity <-> model mapper

use chorus_core::entities::Group;

use crate::models::GroupModel;

impl From<GroupModel> for Group {
    fn from(model: GroupModel) -> Self {
        Group {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
        }
    }
}
