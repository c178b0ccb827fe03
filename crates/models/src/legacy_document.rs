use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::{errors, service_config};

/// Pre-migration document; kind is carried in `content.type`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "legacy_document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub config_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub content: Json,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { ServiceConfig }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ServiceConfig => Entity::belongs_to(service_config::Entity)
                .from(Column::ConfigId)
                .to(service_config::Column::Id)
                .into(),
        }
    }
}

impl Related<service_config::Entity> for Entity {
    fn to() -> RelationDef { Relation::ServiceConfig.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn insert(db: &DatabaseConnection, config_id: &str, id: &str, content: Json) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        config_id: Set(config_id.to_string()),
        id: Set(id.to_string()),
        content: Set(content),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list_by_config(db: &DatabaseConnection, config_id: &str) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::ConfigId.eq(config_id))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
