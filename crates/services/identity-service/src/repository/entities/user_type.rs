//! User type lookup entity.

use sea_orm::entity::prelude::*;

use domain::LookupEntry;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_type_name: String,
    #[sea_orm(unique)]
    pub user_type_value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LookupEntry {
    fn from(model: Model) -> Self {
        LookupEntry {
            id: model.id,
            value: model.user_type_value,
            name: model.user_type_name,
        }
    }
}
