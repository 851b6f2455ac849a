use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::document_entry_work;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DocumentEntryWork {
    pub id: Uuid,
    pub build: String,
    pub work_year: i32,
    pub work_month: i32,
    pub entry_timestamp: DateTime<Utc>,
    pub submission_count: i32,
    pub responsible_employee_id: Option<String>,
    pub current_responsible_employee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentEntryWork {
    pub(crate) fn from_model(model: document_entry_work::Model) -> Self {
        Self {
            id: model.uuid,
            build: model.build,
            work_year: model.work_year,
            work_month: model.work_month,
            entry_timestamp: model.entry_timestamp,
            submission_count: model.submission_count,
            responsible_employee_id: model.responsible_employee_id,
            current_responsible_employee_id: model.current_responsible_employee_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_live<C: ConnectionTrait>(
        db: &C,
        build: &str,
        year: i32,
        month: i32,
    ) -> Result<Option<DocumentEntryWork>, DbErr> {
        Ok(document_entry_work::Entity::find()
            .filter(document_entry_work::Column::Build.eq(build))
            .filter(document_entry_work::Column::WorkYear.eq(year))
            .filter(document_entry_work::Column::WorkMonth.eq(month))
            .filter(document_entry_work::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .map(Self::from_model))
    }
}
