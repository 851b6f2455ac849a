//! Reset cascade: rebuilds the dependent monthly rows for one
//! (build, year, month) from the assignment's role values.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entities::{document_entry_work, monthly_tax_data},
    types::RoleAssignments,
};

/// Soft-deletes the live `monthly_tax_data` and `document_entry_work`
/// rows for the key and inserts fresh ones seeded from `roles`, all in
/// one transaction. Running it again with the same inputs replaces the
/// rows it created, so repeated resets converge on a single live row
/// per table.
pub async fn reset_monthly_data<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    build: &str,
    year: i32,
    month: i32,
    roles: &RoleAssignments,
) -> Result<(), DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;

    monthly_tax_data::Entity::update_many()
        .col_expr(monthly_tax_data::Column::DeletedAt, Expr::value(Some(now)))
        .col_expr(monthly_tax_data::Column::UpdatedAt, Expr::value(now))
        .filter(monthly_tax_data::Column::Build.eq(build))
        .filter(monthly_tax_data::Column::TaxYear.eq(year))
        .filter(monthly_tax_data::Column::TaxMonth.eq(month))
        .filter(monthly_tax_data::Column::DeletedAt.is_null())
        .exec(&txn)
        .await?;

    document_entry_work::Entity::update_many()
        .col_expr(
            document_entry_work::Column::DeletedAt,
            Expr::value(Some(now)),
        )
        .col_expr(document_entry_work::Column::UpdatedAt, Expr::value(now))
        .filter(document_entry_work::Column::Build.eq(build))
        .filter(document_entry_work::Column::WorkYear.eq(year))
        .filter(document_entry_work::Column::WorkMonth.eq(month))
        .filter(document_entry_work::Column::DeletedAt.is_null())
        .exec(&txn)
        .await?;

    monthly_tax_data::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        build: Set(build.to_string()),
        tax_year: Set(year),
        tax_month: Set(month),
        accounting_responsible: Set(roles.accounting.clone()),
        original_accounting_responsible: Set(roles.accounting.clone()),
        current_accounting_responsible: Set(roles.accounting.clone()),
        tax_inspection_responsible: Set(roles.tax_inspection.clone()),
        original_tax_inspection_responsible: Set(roles.tax_inspection.clone()),
        current_tax_inspection_responsible: Set(roles.tax_inspection.clone()),
        document_entry_responsible: Set(roles.document_entry.clone()),
        original_document_entry_responsible: Set(roles.document_entry.clone()),
        current_document_entry_responsible: Set(roles.document_entry.clone()),
        wht_filer_employee_id: Set(roles.wht_filer.clone()),
        original_wht_filer_employee_id: Set(roles.wht_filer.clone()),
        wht_filer_current_employee_id: Set(roles.wht_filer.clone()),
        vat_filer_employee_id: Set(roles.vat_filer.clone()),
        original_vat_filer_employee_id: Set(roles.vat_filer.clone()),
        vat_filer_current_employee_id: Set(roles.vat_filer.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    document_entry_work::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        build: Set(build.to_string()),
        work_year: Set(year),
        work_month: Set(month),
        entry_timestamp: Set(now),
        submission_count: Set(1),
        responsible_employee_id: Set(roles.document_entry.clone()),
        current_responsible_employee_id: Set(roles.document_entry.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await
}
