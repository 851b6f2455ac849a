use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::monthly_tax_data, types::RoleType};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MonthlyTaxData {
    pub id: Uuid,
    pub build: String,
    pub tax_year: i32,
    pub tax_month: i32,
    pub accounting_responsible: Option<String>,
    pub original_accounting_responsible: Option<String>,
    pub current_accounting_responsible: Option<String>,
    pub tax_inspection_responsible: Option<String>,
    pub original_tax_inspection_responsible: Option<String>,
    pub current_tax_inspection_responsible: Option<String>,
    pub document_entry_responsible: Option<String>,
    pub original_document_entry_responsible: Option<String>,
    pub current_document_entry_responsible: Option<String>,
    pub wht_filer_employee_id: Option<String>,
    pub original_wht_filer_employee_id: Option<String>,
    pub wht_filer_current_employee_id: Option<String>,
    pub vat_filer_employee_id: Option<String>,
    pub original_vat_filer_employee_id: Option<String>,
    pub vat_filer_current_employee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyTaxData {
    pub(crate) fn from_model(model: monthly_tax_data::Model) -> Self {
        Self {
            id: model.uuid,
            build: model.build,
            tax_year: model.tax_year,
            tax_month: model.tax_month,
            accounting_responsible: model.accounting_responsible,
            original_accounting_responsible: model.original_accounting_responsible,
            current_accounting_responsible: model.current_accounting_responsible,
            tax_inspection_responsible: model.tax_inspection_responsible,
            original_tax_inspection_responsible: model.original_tax_inspection_responsible,
            current_tax_inspection_responsible: model.current_tax_inspection_responsible,
            document_entry_responsible: model.document_entry_responsible,
            original_document_entry_responsible: model.original_document_entry_responsible,
            current_document_entry_responsible: model.current_document_entry_responsible,
            wht_filer_employee_id: model.wht_filer_employee_id,
            original_wht_filer_employee_id: model.original_wht_filer_employee_id,
            wht_filer_current_employee_id: model.wht_filer_current_employee_id,
            vat_filer_employee_id: model.vat_filer_employee_id,
            original_vat_filer_employee_id: model.original_vat_filer_employee_id,
            vat_filer_current_employee_id: model.vat_filer_current_employee_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_live<C: ConnectionTrait>(
        db: &C,
        build: &str,
        year: i32,
        month: i32,
    ) -> Result<Option<MonthlyTaxData>, DbErr> {
        Ok(monthly_tax_data::Entity::find()
            .filter(monthly_tax_data::Column::Build.eq(build))
            .filter(monthly_tax_data::Column::TaxYear.eq(year))
            .filter(monthly_tax_data::Column::TaxMonth.eq(month))
            .filter(monthly_tax_data::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .map(Self::from_model))
    }

    /// Patches the main and current columns for one role on the live
    /// row. Zero affected rows is fine; the monthly row may not exist
    /// yet when a reset previously failed.
    pub async fn set_role<C: ConnectionTrait>(
        db: &C,
        build: &str,
        year: i32,
        month: i32,
        role: RoleType,
        employee_id: &str,
    ) -> Result<u64, DbErr> {
        let (main, _original, current) = role.monthly_columns();
        let result = monthly_tax_data::Entity::update_many()
            .col_expr(main, Expr::value(Some(employee_id.to_string())))
            .col_expr(current, Expr::value(Some(employee_id.to_string())))
            .col_expr(monthly_tax_data::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(monthly_tax_data::Column::Build.eq(build))
            .filter(monthly_tax_data::Column::TaxYear.eq(year))
            .filter(monthly_tax_data::Column::TaxMonth.eq(month))
            .filter(monthly_tax_data::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
