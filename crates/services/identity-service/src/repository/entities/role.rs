//! Role lookup entity.

use sea_orm::entity::prelude::*;

use domain::LookupEntry;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub role_name: String,
    #[sea_orm(unique)]
    pub role_value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LookupEntry {
    fn from(model: Model) -> Self {
        LookupEntry {
            id: model.id,
            value: model.role_value,
            name: model.role_name,
        }
    }
}
