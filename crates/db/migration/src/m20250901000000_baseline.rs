use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Clients::Table)
                    .col(pk_id_col(manager, Clients::Id))
                    .col(uuid_col(Clients::Uuid))
                    .col(ColumnDef::new(Clients::Build).string().not_null())
                    .col(ColumnDef::new(Clients::CompanyName).string().not_null())
                    .col(timestamp_col(Clients::CreatedAt))
                    .col(timestamp_col(Clients::UpdatedAt))
                    .col(timestamp_nullable_col(Clients::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clients_build")
                    .table(Clients::Table)
                    .col(Clients::Build)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Employees::Table)
                    .col(pk_id_col(manager, Employees::Id))
                    .col(uuid_col(Employees::Uuid))
                    .col(ColumnDef::new(Employees::EmployeeId).string().not_null())
                    .col(ColumnDef::new(Employees::FullName).string().not_null())
                    .col(ColumnDef::new(Employees::NickName).string())
                    .col(timestamp_col(Employees::CreatedAt))
                    .col(timestamp_col(Employees::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employees_employee_id")
                    .table(Employees::Table)
                    .col(Employees::EmployeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(WorkAssignments::Table)
                    .col(pk_id_col(manager, WorkAssignments::Id))
                    .col(uuid_col(WorkAssignments::Uuid))
                    .col(ColumnDef::new(WorkAssignments::Build).string().not_null())
                    .col(
                        ColumnDef::new(WorkAssignments::AssignmentYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkAssignments::AssignmentMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(employee_ref_col(WorkAssignments::AccountingResponsible))
                    .col(employee_ref_col(
                        WorkAssignments::OriginalAccountingResponsible,
                    ))
                    .col(employee_ref_col(
                        WorkAssignments::CurrentAccountingResponsible,
                    ))
                    .col(employee_ref_col(WorkAssignments::TaxInspectionResponsible))
                    .col(employee_ref_col(
                        WorkAssignments::OriginalTaxInspectionResponsible,
                    ))
                    .col(employee_ref_col(
                        WorkAssignments::CurrentTaxInspectionResponsible,
                    ))
                    .col(employee_ref_col(WorkAssignments::WhtFilerResponsible))
                    .col(employee_ref_col(
                        WorkAssignments::OriginalWhtFilerResponsible,
                    ))
                    .col(employee_ref_col(
                        WorkAssignments::CurrentWhtFilerResponsible,
                    ))
                    .col(employee_ref_col(WorkAssignments::VatFilerResponsible))
                    .col(employee_ref_col(
                        WorkAssignments::OriginalVatFilerResponsible,
                    ))
                    .col(employee_ref_col(
                        WorkAssignments::CurrentVatFilerResponsible,
                    ))
                    .col(employee_ref_col(WorkAssignments::DocumentEntryResponsible))
                    .col(employee_ref_col(
                        WorkAssignments::OriginalDocumentEntryResponsible,
                    ))
                    .col(employee_ref_col(
                        WorkAssignments::CurrentDocumentEntryResponsible,
                    ))
                    .col(
                        ColumnDef::new(WorkAssignments::AssignedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(timestamp_col(WorkAssignments::AssignedAt))
                    .col(ColumnDef::new(WorkAssignments::AssignmentNote).text())
                    .col(
                        ColumnDef::new(WorkAssignments::IsActive)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(
                        ColumnDef::new(WorkAssignments::IsResetCompleted)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(timestamp_nullable_col(WorkAssignments::ResetCompletedAt))
                    .col(timestamp_col(WorkAssignments::CreatedAt))
                    .col(timestamp_col(WorkAssignments::UpdatedAt))
                    .col(timestamp_nullable_col(WorkAssignments::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_work_assignments_uuid")
                    .table(WorkAssignments::Table)
                    .col(WorkAssignments::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_work_assignments_build")
                    .table(WorkAssignments::Table)
                    .col(WorkAssignments::Build)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(MonthlyTaxData::Table)
                    .col(pk_id_col(manager, MonthlyTaxData::Id))
                    .col(uuid_col(MonthlyTaxData::Uuid))
                    .col(ColumnDef::new(MonthlyTaxData::Build).string().not_null())
                    .col(ColumnDef::new(MonthlyTaxData::TaxYear).integer().not_null())
                    .col(
                        ColumnDef::new(MonthlyTaxData::TaxMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(employee_ref_col(MonthlyTaxData::AccountingResponsible))
                    .col(employee_ref_col(
                        MonthlyTaxData::OriginalAccountingResponsible,
                    ))
                    .col(employee_ref_col(
                        MonthlyTaxData::CurrentAccountingResponsible,
                    ))
                    .col(employee_ref_col(MonthlyTaxData::TaxInspectionResponsible))
                    .col(employee_ref_col(
                        MonthlyTaxData::OriginalTaxInspectionResponsible,
                    ))
                    .col(employee_ref_col(
                        MonthlyTaxData::CurrentTaxInspectionResponsible,
                    ))
                    .col(employee_ref_col(MonthlyTaxData::DocumentEntryResponsible))
                    .col(employee_ref_col(
                        MonthlyTaxData::OriginalDocumentEntryResponsible,
                    ))
                    .col(employee_ref_col(
                        MonthlyTaxData::CurrentDocumentEntryResponsible,
                    ))
                    // The WHT/VAT columns intentionally use the *_employee_id
                    // naming inherited from the tax-filing reports that read
                    // this table.
                    .col(employee_ref_col(MonthlyTaxData::WhtFilerEmployeeId))
                    .col(employee_ref_col(MonthlyTaxData::OriginalWhtFilerEmployeeId))
                    .col(employee_ref_col(MonthlyTaxData::WhtFilerCurrentEmployeeId))
                    .col(employee_ref_col(MonthlyTaxData::VatFilerEmployeeId))
                    .col(employee_ref_col(MonthlyTaxData::OriginalVatFilerEmployeeId))
                    .col(employee_ref_col(MonthlyTaxData::VatFilerCurrentEmployeeId))
                    .col(timestamp_col(MonthlyTaxData::CreatedAt))
                    .col(timestamp_col(MonthlyTaxData::UpdatedAt))
                    .col(timestamp_nullable_col(MonthlyTaxData::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_monthly_tax_data_uuid")
                    .table(MonthlyTaxData::Table)
                    .col(MonthlyTaxData::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(DocumentEntryWork::Table)
                    .col(pk_id_col(manager, DocumentEntryWork::Id))
                    .col(uuid_col(DocumentEntryWork::Uuid))
                    .col(ColumnDef::new(DocumentEntryWork::Build).string().not_null())
                    .col(
                        ColumnDef::new(DocumentEntryWork::WorkYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentEntryWork::WorkMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(timestamp_col(DocumentEntryWork::EntryTimestamp))
                    .col(
                        ColumnDef::new(DocumentEntryWork::SubmissionCount)
                            .integer()
                            .not_null()
                            .default(Expr::val(1)),
                    )
                    .col(employee_ref_col(DocumentEntryWork::ResponsibleEmployeeId))
                    .col(employee_ref_col(
                        DocumentEntryWork::CurrentResponsibleEmployeeId,
                    ))
                    .col(timestamp_col(DocumentEntryWork::CreatedAt))
                    .col(timestamp_col(DocumentEntryWork::UpdatedAt))
                    .col(timestamp_nullable_col(DocumentEntryWork::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_document_entry_work_uuid")
                    .table(DocumentEntryWork::Table)
                    .col(DocumentEntryWork::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(ResponsibilityChangeHistory::Table)
                    .col(pk_id_col(manager, ResponsibilityChangeHistory::Id))
                    .col(uuid_col(ResponsibilityChangeHistory::Uuid))
                    .col(fk_id_col(
                        manager,
                        ResponsibilityChangeHistory::WorkAssignmentId,
                    ))
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::Build)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::AssignmentYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::AssignmentMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::RoleType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(employee_ref_col(
                        ResponsibilityChangeHistory::PreviousEmployeeId,
                    ))
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::NewEmployeeId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResponsibilityChangeHistory::ChangedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResponsibilityChangeHistory::ChangeReason).text())
                    .col(timestamp_col(ResponsibilityChangeHistory::ChangedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_responsibility_change_history_work_assignment_id")
                            .from(
                                ResponsibilityChangeHistory::Table,
                                ResponsibilityChangeHistory::WorkAssignmentId,
                            )
                            .to(WorkAssignments::Table, WorkAssignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_responsibility_change_history_work_assignment_id")
                    .table(ResponsibilityChangeHistory::Table)
                    .col(ResponsibilityChangeHistory::WorkAssignmentId)
                    .to_owned(),
            )
            .await?;

        // At most one live row per (build, year, month); soft-deleted rows
        // stay behind as history, so the uniqueness is partial.
        for sql in [
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_work_assignments_build_month_live \
             ON work_assignments (build, assignment_year, assignment_month) \
             WHERE deleted_at IS NULL;",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_monthly_tax_data_build_month_live \
             ON monthly_tax_data (build, tax_year, tax_month) \
             WHERE deleted_at IS NULL;",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_document_entry_work_build_month_live \
             ON document_entry_work (build, work_year, work_month) \
             WHERE deleted_at IS NULL;",
        ] {
            manager.get_connection().execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ResponsibilityChangeHistory::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentEntryWork::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyTaxData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn timestamp_nullable_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).timestamp().to_owned()
}

// Employee codes are cross-system identifiers (payroll owns them), so
// they are plain strings here rather than foreign keys into employees.
fn employee_ref_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string_len(32).to_owned()
}

#[derive(Iden)]
enum Clients {
    Table,
    Id,
    Uuid,
    Build,
    CompanyName,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Employees {
    Table,
    Id,
    Uuid,
    EmployeeId,
    FullName,
    NickName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WorkAssignments {
    Table,
    Id,
    Uuid,
    Build,
    AssignmentYear,
    AssignmentMonth,
    AccountingResponsible,
    OriginalAccountingResponsible,
    CurrentAccountingResponsible,
    TaxInspectionResponsible,
    OriginalTaxInspectionResponsible,
    CurrentTaxInspectionResponsible,
    WhtFilerResponsible,
    OriginalWhtFilerResponsible,
    CurrentWhtFilerResponsible,
    VatFilerResponsible,
    OriginalVatFilerResponsible,
    CurrentVatFilerResponsible,
    DocumentEntryResponsible,
    OriginalDocumentEntryResponsible,
    CurrentDocumentEntryResponsible,
    AssignedBy,
    AssignedAt,
    AssignmentNote,
    IsActive,
    IsResetCompleted,
    ResetCompletedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum MonthlyTaxData {
    Table,
    Id,
    Uuid,
    Build,
    TaxYear,
    TaxMonth,
    AccountingResponsible,
    OriginalAccountingResponsible,
    CurrentAccountingResponsible,
    TaxInspectionResponsible,
    OriginalTaxInspectionResponsible,
    CurrentTaxInspectionResponsible,
    DocumentEntryResponsible,
    OriginalDocumentEntryResponsible,
    CurrentDocumentEntryResponsible,
    WhtFilerEmployeeId,
    OriginalWhtFilerEmployeeId,
    WhtFilerCurrentEmployeeId,
    VatFilerEmployeeId,
    OriginalVatFilerEmployeeId,
    VatFilerCurrentEmployeeId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum DocumentEntryWork {
    Table,
    Id,
    Uuid,
    Build,
    WorkYear,
    WorkMonth,
    EntryTimestamp,
    SubmissionCount,
    ResponsibleEmployeeId,
    CurrentResponsibleEmployeeId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum ResponsibilityChangeHistory {
    Table,
    Id,
    Uuid,
    WorkAssignmentId,
    Build,
    AssignmentYear,
    AssignmentMonth,
    RoleType,
    PreviousEmployeeId,
    NewEmployeeId,
    ChangedBy,
    ChangeReason,
    ChangedAt,
}
