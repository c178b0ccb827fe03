use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Versioned document scoped by service object config.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub config_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub doc_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub content: Json,
    pub sequence: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find<C: ConnectionTrait>(db: &C, config_id: &str, id: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id((config_id.to_string(), id.to_string()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn count_for_config(db: &DatabaseConnection, config_id: &str) -> Result<u64, errors::ModelError> {
    use sea_orm::{PaginatorTrait, QueryFilter};
    Entity::find()
        .filter(Column::ConfigId.eq(config_id))
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
