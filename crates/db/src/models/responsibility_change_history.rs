use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::responsibility_change_history,
    models::ids,
    types::RoleType,
};

/// One audit entry. Rows are append-only; nothing in the crate updates
/// or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ResponsibilityChange {
    pub id: Uuid,
    pub work_assignment_id: Uuid,
    pub build: String,
    pub assignment_year: i32,
    pub assignment_month: i32,
    pub role_type: RoleType,
    pub previous_employee_id: Option<String>,
    pub new_employee_id: String,
    pub changed_by: Uuid,
    pub change_reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateResponsibilityChange {
    pub work_assignment_id: Uuid,
    pub build: String,
    pub assignment_year: i32,
    pub assignment_month: i32,
    pub role_type: RoleType,
    pub previous_employee_id: Option<String>,
    pub new_employee_id: String,
    pub changed_by: Uuid,
    pub change_reason: Option<String>,
}

impl ResponsibilityChange {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: responsibility_change_history::Model,
    ) -> Result<Self, DbErr> {
        let assignment_uuid = ids::work_assignment_uuid_by_id(db, model.work_assignment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Work assignment not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            work_assignment_id: assignment_uuid,
            build: model.build,
            assignment_year: model.assignment_year,
            assignment_month: model.assignment_month,
            role_type: model.role_type,
            previous_employee_id: model.previous_employee_id,
            new_employee_id: model.new_employee_id,
            changed_by: model.changed_by,
            change_reason: model.change_reason,
            changed_at: model.changed_at,
        })
    }

    pub async fn append<C: ConnectionTrait>(
        db: &C,
        data: &CreateResponsibilityChange,
    ) -> Result<ResponsibilityChange, DbErr> {
        let assignment_id = ids::work_assignment_id_by_uuid(db, data.work_assignment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Work assignment not found".to_string()))?;
        let model = responsibility_change_history::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            work_assignment_id: Set(assignment_id),
            build: Set(data.build.clone()),
            assignment_year: Set(data.assignment_year),
            assignment_month: Set(data.assignment_month),
            role_type: Set(data.role_type),
            previous_employee_id: Set(data.previous_employee_id.clone()),
            new_employee_id: Set(data.new_employee_id.clone()),
            changed_by: Set(data.changed_by),
            change_reason: Set(data.change_reason.clone()),
            changed_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = model.insert(db).await?;
        Self::from_model(db, model).await
    }

    /// All changes for one assignment, newest first. Ties on
    /// `changed_at` fall back to insertion order.
    pub async fn list_for_assignment<C: ConnectionTrait>(
        db: &C,
        work_assignment_uuid: Uuid,
    ) -> Result<Vec<ResponsibilityChange>, DbErr> {
        let Some(assignment_id) = ids::work_assignment_id_by_uuid(db, work_assignment_uuid).await?
        else {
            return Err(DbErr::RecordNotFound("Work assignment not found".to_string()));
        };
        let models = responsibility_change_history::Entity::find()
            .filter(
                responsibility_change_history::Column::WorkAssignmentId.eq(assignment_id),
            )
            .order_by_desc(responsibility_change_history::Column::ChangedAt)
            .order_by_desc(responsibility_change_history::Column::Id)
            .all(db)
            .await?;
        let mut changes = Vec::with_capacity(models.len());
        for model in models {
            changes.push(Self::from_model(db, model).await?);
        }
        Ok(changes)
    }
}
