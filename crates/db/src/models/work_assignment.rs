use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{document_entry_work, monthly_tax_data, work_assignment},
    retry::retry_on_connection_reset,
    types::{RoleAssignments, RoleType},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WorkAssignment {
    pub id: Uuid,
    pub build: String,
    pub assignment_year: i32,
    pub assignment_month: i32,
    pub accounting_responsible: Option<String>,
    pub original_accounting_responsible: Option<String>,
    pub current_accounting_responsible: Option<String>,
    pub tax_inspection_responsible: Option<String>,
    pub original_tax_inspection_responsible: Option<String>,
    pub current_tax_inspection_responsible: Option<String>,
    pub wht_filer_responsible: Option<String>,
    pub original_wht_filer_responsible: Option<String>,
    pub current_wht_filer_responsible: Option<String>,
    pub vat_filer_responsible: Option<String>,
    pub original_vat_filer_responsible: Option<String>,
    pub current_vat_filer_responsible: Option<String>,
    pub document_entry_responsible: Option<String>,
    pub original_document_entry_responsible: Option<String>,
    pub current_document_entry_responsible: Option<String>,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub assignment_note: Option<String>,
    pub is_active: bool,
    pub is_reset_completed: bool,
    pub reset_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateWorkAssignment {
    pub build: String,
    pub assignment_year: i32,
    pub assignment_month: i32,
    pub roles: RoleAssignments,
    pub assignment_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateWorkAssignment {
    pub roles: Option<RoleAssignments>,
    pub assignment_note: Option<String>,
    pub is_active: Option<bool>,
}

/// sqlite and mysql spell unique-key violations differently; both map
/// to a duplicate-assignment conflict upstream.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("UNIQUE constraint failed") || message.contains("Duplicate entry")
}

impl WorkAssignment {
    pub(crate) fn from_model(model: work_assignment::Model) -> Self {
        Self {
            id: model.uuid,
            build: model.build,
            assignment_year: model.assignment_year,
            assignment_month: model.assignment_month,
            accounting_responsible: model.accounting_responsible,
            original_accounting_responsible: model.original_accounting_responsible,
            current_accounting_responsible: model.current_accounting_responsible,
            tax_inspection_responsible: model.tax_inspection_responsible,
            original_tax_inspection_responsible: model.original_tax_inspection_responsible,
            current_tax_inspection_responsible: model.current_tax_inspection_responsible,
            wht_filer_responsible: model.wht_filer_responsible,
            original_wht_filer_responsible: model.original_wht_filer_responsible,
            current_wht_filer_responsible: model.current_wht_filer_responsible,
            vat_filer_responsible: model.vat_filer_responsible,
            original_vat_filer_responsible: model.original_vat_filer_responsible,
            current_vat_filer_responsible: model.current_vat_filer_responsible,
            document_entry_responsible: model.document_entry_responsible,
            original_document_entry_responsible: model.original_document_entry_responsible,
            current_document_entry_responsible: model.current_document_entry_responsible,
            assigned_by: model.assigned_by,
            assigned_at: model.assigned_at,
            assignment_note: model.assignment_note,
            is_active: model.is_active,
            is_reset_completed: model.is_reset_completed,
            reset_completed_at: model.reset_completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Current responsibility per role, as read by the reset cascade.
    pub fn role_assignments(&self) -> RoleAssignments {
        RoleAssignments {
            accounting: self.current_accounting_responsible.clone(),
            tax_inspection: self.current_tax_inspection_responsible.clone(),
            wht_filer: self.current_wht_filer_responsible.clone(),
            vat_filer: self.current_vat_filer_responsible.clone(),
            document_entry: self.current_document_entry_responsible.clone(),
        }
    }

    pub fn role_value(&self, role: RoleType) -> Option<&str> {
        match role {
            RoleType::Accounting => self.current_accounting_responsible.as_deref(),
            RoleType::TaxInspection => self.current_tax_inspection_responsible.as_deref(),
            RoleType::WhtFiler => self.current_wht_filer_responsible.as_deref(),
            RoleType::VatFiler => self.current_vat_filer_responsible.as_deref(),
            RoleType::DocumentEntry => self.current_document_entry_responsible.as_deref(),
        }
    }

    pub async fn find_by_key<C: ConnectionTrait>(
        db: &C,
        build: &str,
        year: i32,
        month: i32,
    ) -> Result<Option<WorkAssignment>, DbErr> {
        let model = retry_on_connection_reset(|| {
            work_assignment::Entity::find()
                .filter(work_assignment::Column::Build.eq(build))
                .filter(work_assignment::Column::AssignmentYear.eq(year))
                .filter(work_assignment::Column::AssignmentMonth.eq(month))
                .filter(work_assignment::Column::DeletedAt.is_null())
                .one(db)
        })
        .await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(
        db: &C,
        uuid: Uuid,
    ) -> Result<Option<WorkAssignment>, DbErr> {
        let model = retry_on_connection_reset(|| {
            work_assignment::Entity::find()
                .filter(work_assignment::Column::Uuid.eq(uuid))
                .filter(work_assignment::Column::DeletedAt.is_null())
                .one(db)
        })
        .await?;
        Ok(model.map(Self::from_model))
    }

    /// Inserts a new assignment; main, original and current columns all
    /// start from the same role values. The partial unique index turns
    /// a concurrent duplicate into a `DbErr` classified by
    /// [`is_unique_violation`].
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateWorkAssignment,
        assigned_by: Uuid,
    ) -> Result<WorkAssignment, DbErr> {
        let now = Utc::now();
        let roles = &data.roles;
        let model = work_assignment::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            build: Set(data.build.clone()),
            assignment_year: Set(data.assignment_year),
            assignment_month: Set(data.assignment_month),
            accounting_responsible: Set(roles.accounting.clone()),
            original_accounting_responsible: Set(roles.accounting.clone()),
            current_accounting_responsible: Set(roles.accounting.clone()),
            tax_inspection_responsible: Set(roles.tax_inspection.clone()),
            original_tax_inspection_responsible: Set(roles.tax_inspection.clone()),
            current_tax_inspection_responsible: Set(roles.tax_inspection.clone()),
            wht_filer_responsible: Set(roles.wht_filer.clone()),
            original_wht_filer_responsible: Set(roles.wht_filer.clone()),
            current_wht_filer_responsible: Set(roles.wht_filer.clone()),
            vat_filer_responsible: Set(roles.vat_filer.clone()),
            original_vat_filer_responsible: Set(roles.vat_filer.clone()),
            current_vat_filer_responsible: Set(roles.vat_filer.clone()),
            document_entry_responsible: Set(roles.document_entry.clone()),
            original_document_entry_responsible: Set(roles.document_entry.clone()),
            current_document_entry_responsible: Set(roles.document_entry.clone()),
            assigned_by: Set(assigned_by),
            assigned_at: Set(now),
            assignment_note: Set(data.assignment_note.clone()),
            is_active: Set(true),
            is_reset_completed: Set(false),
            reset_completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };
        let model = model.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Edits roles, note and active flag. Provided roles overwrite the
    /// main and current columns; the original columns keep the values
    /// recorded at creation.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        uuid: Uuid,
        data: &UpdateWorkAssignment,
    ) -> Result<WorkAssignment, DbErr> {
        let model = work_assignment::Entity::find()
            .filter(work_assignment::Column::Uuid.eq(uuid))
            .filter(work_assignment::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Work assignment not found".to_string()))?;

        let mut active: work_assignment::ActiveModel = model.into();
        if let Some(roles) = &data.roles {
            active.accounting_responsible = Set(roles.accounting.clone());
            active.current_accounting_responsible = Set(roles.accounting.clone());
            active.tax_inspection_responsible = Set(roles.tax_inspection.clone());
            active.current_tax_inspection_responsible = Set(roles.tax_inspection.clone());
            active.wht_filer_responsible = Set(roles.wht_filer.clone());
            active.current_wht_filer_responsible = Set(roles.wht_filer.clone());
            active.vat_filer_responsible = Set(roles.vat_filer.clone());
            active.current_vat_filer_responsible = Set(roles.vat_filer.clone());
            active.document_entry_responsible = Set(roles.document_entry.clone());
            active.current_document_entry_responsible = Set(roles.document_entry.clone());
        }
        if let Some(note) = &data.assignment_note {
            active.assignment_note = Set(Some(note.clone()));
        }
        if let Some(is_active) = data.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(db).await?;
        Ok(Self::from_model(model))
    }

    /// Flags the reset cascade outcome on the assignment row.
    pub async fn mark_reset_completed<C: ConnectionTrait>(
        db: &C,
        uuid: Uuid,
        completed: bool,
    ) -> Result<(), DbErr> {
        let now = Utc::now();
        work_assignment::Entity::update_many()
            .col_expr(
                work_assignment::Column::IsResetCompleted,
                Expr::value(completed),
            )
            .col_expr(
                work_assignment::Column::ResetCompletedAt,
                Expr::value(completed.then_some(now)),
            )
            .col_expr(work_assignment::Column::UpdatedAt, Expr::value(now))
            .filter(work_assignment::Column::Uuid.eq(uuid))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Rewrites the main and current columns for one role, leaving the
    /// original column untouched. Runs inside the caller's transaction.
    pub async fn set_role<C: ConnectionTrait>(
        db: &C,
        uuid: Uuid,
        role: RoleType,
        employee_id: &str,
    ) -> Result<(), DbErr> {
        let (main, _original, current) = role.assignment_columns();
        work_assignment::Entity::update_many()
            .col_expr(main, Expr::value(Some(employee_id.to_string())))
            .col_expr(current, Expr::value(Some(employee_id.to_string())))
            .col_expr(work_assignment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(work_assignment::Column::Uuid.eq(uuid))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Soft-deletes the assignment and its dependent monthly rows in
    /// one transaction.
    pub async fn soft_delete_cascade<C: ConnectionTrait + TransactionTrait>(
        db: &C,
        uuid: Uuid,
    ) -> Result<(), DbErr> {
        let model = work_assignment::Entity::find()
            .filter(work_assignment::Column::Uuid.eq(uuid))
            .filter(work_assignment::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Work assignment not found".to_string()))?;

        let now = Utc::now();
        let txn = db.begin().await?;

        work_assignment::Entity::update_many()
            .col_expr(work_assignment::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(work_assignment::Column::UpdatedAt, Expr::value(now))
            .filter(work_assignment::Column::Id.eq(model.id))
            .exec(&txn)
            .await?;

        monthly_tax_data::Entity::update_many()
            .col_expr(monthly_tax_data::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(monthly_tax_data::Column::UpdatedAt, Expr::value(now))
            .filter(monthly_tax_data::Column::Build.eq(model.build.clone()))
            .filter(monthly_tax_data::Column::TaxYear.eq(model.assignment_year))
            .filter(monthly_tax_data::Column::TaxMonth.eq(model.assignment_month))
            .filter(monthly_tax_data::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        document_entry_work::Entity::update_many()
            .col_expr(
                document_entry_work::Column::DeletedAt,
                Expr::value(Some(now)),
            )
            .col_expr(document_entry_work::Column::UpdatedAt, Expr::value(now))
            .filter(document_entry_work::Column::Build.eq(model.build))
            .filter(document_entry_work::Column::WorkYear.eq(model.assignment_year))
            .filter(document_entry_work::Column::WorkMonth.eq(model.assignment_month))
            .filter(document_entry_work::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        txn.commit().await
    }
}
