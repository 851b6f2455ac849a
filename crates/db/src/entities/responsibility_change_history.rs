use sea_orm::entity::prelude::*;

use crate::types::RoleType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "responsibility_change_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub work_assignment_id: i64,
    pub build: String,
    pub assignment_year: i32,
    pub assignment_month: i32,
    pub role_type: RoleType,
    pub previous_employee_id: Option<String>,
    pub new_employee_id: String,
    pub changed_by: Uuid,
    pub change_reason: Option<String>,
    pub changed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
