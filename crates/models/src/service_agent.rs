use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_agent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub service_type: String,
    pub sequence: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    id: &str,
    service_type: &str,
    created_at: DateTime<Utc>,
) -> Result<Model, errors::ModelError> {
    if id.trim().is_empty() || service_type.trim().is_empty() {
        return Err(errors::ModelError::Validation("id and service_type required".into()));
    }
    let am = ActiveModel {
        id: Set(id.to_string()),
        service_type: Set(service_type.to_string()),
        sequence: Set(0),
        created_at: Set(created_at.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Agents never updated (`sequence == 0`) and created on or before `cutoff`.
pub async fn find_unmigrated(
    db: &DatabaseConnection,
    cutoff: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<Model>, errors::ModelError> {
    let cutoff: DateTimeWithTimeZone = cutoff.into();
    Entity::find()
        .filter(Column::Sequence.eq(0i64))
        .filter(Column::CreatedAt.lte(cutoff))
        .limit(limit)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Compare-and-swap bump of `sequence`; `false` when another writer got there first.
pub async fn bump_sequence(db: &DatabaseConnection, id: &str, expected: i64) -> Result<bool, errors::ModelError> {
    use sea_orm::sea_query::Expr;
    let res = Entity::update_many()
        .col_expr(Column::Sequence, Expr::value(expected + 1))
        .filter(Column::Id.eq(id))
        .filter(Column::Sequence.eq(expected))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected == 1)
}
