use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Service object config; its id is the scope documents are stored under.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub service_type: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { LegacyDocument }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::LegacyDocument => Entity::has_many(crate::legacy_document::Entity).into(),
        }
    }
}

impl Related<crate::legacy_document::Entity> for Entity {
    fn to() -> RelationDef { Relation::LegacyDocument.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, id: &str, service_type: &str) -> Result<Model, errors::ModelError> {
    if id.trim().is_empty() { return Err(errors::ModelError::Validation("id required".into())); }
    let am = ActiveModel {
        id: Set(id.to_string()),
        service_type: Set(service_type.to_string()),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list_by_service_type(db: &DatabaseConnection, service_type: &str) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::ServiceType.eq(service_type))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
