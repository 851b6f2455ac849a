use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::client;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub build: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    fn from_model(model: client::Model) -> Self {
        Self {
            id: model.uuid,
            build: model.build,
            company_name: model.company_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_build<C: ConnectionTrait>(
        db: &C,
        build: &str,
    ) -> Result<Option<Client>, DbErr> {
        Ok(client::Entity::find()
            .filter(client::Column::Build.eq(build))
            .filter(client::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .map(Self::from_model))
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, build: &str) -> Result<bool, DbErr> {
        Ok(Self::find_by_build(db, build).await?.is_some())
    }
}
