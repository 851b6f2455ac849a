use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "work_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
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
    pub assigned_at: DateTimeUtc,
    pub assignment_note: Option<String>,
    pub is_active: bool,
    pub is_reset_completed: bool,
    pub reset_completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
