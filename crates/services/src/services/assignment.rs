use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use db::{
    DBService, DbErr, TransactionTrait,
    models::{
        employee::Employee,
        monthly_tax_data::MonthlyTaxData,
        reset::reset_monthly_data,
        responsibility_change_history::{CreateResponsibilityChange, ResponsibilityChange},
        work_assignment::{
            CreateWorkAssignment, UpdateWorkAssignment, WorkAssignment, is_unique_violation,
        },
    },
    types::{RoleAssignments, RoleType},
};

use crate::services::{
    job_queue::{JobProcessor, JobQueueService, ProgressHandle},
    response_cache::ResponseCacheService,
};

/// Every cached work-assignment listing goes stale together after a
/// mutation, so one pattern covers them all.
const ASSIGNMENT_CACHE_PATTERN: &str = "GET:/work-assignments";

/// Deleting an assignment soft-deletes its monthly rows too, so the
/// cached views over those tables go stale with it.
const MONTHLY_TAX_CACHE_PATTERN: &str = "GET:/monthly-tax-data";
const DOCUMENT_ENTRY_CACHE_PATTERN: &str = "GET:/document-entry-work";

const BULK_MAX_ROWS: usize = 1000;

pub const BULK_CREATE_JOB_TYPE: &str = "bulk_create_assignments";

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Assignment month must be between 1 and 12")]
    InvalidMonth,
    #[error("Bulk request must contain at least one assignment")]
    EmptyBulk,
    #[error("Bulk request exceeds the {BULK_MAX_ROWS} row limit")]
    TooManyRows,
    #[error("Client not found: {0}")]
    UnknownClient(String),
    #[error("Unknown employees: {0}")]
    UnknownEmployees(String),
    #[error("New responsible employee id must not be blank")]
    BlankEmployee,
    #[error("{employee_id} already holds the {role_label} role")]
    NoOpChange {
        employee_id: String,
        role_label: &'static str,
    },
    #[error("An assignment already exists for this client and month")]
    Duplicate,
    #[error("Work assignment not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Result of a create or edit. `reset_error` set means the assignment
/// row exists but the monthly cascade did not run; the manual
/// reset-data operation repairs it.
#[derive(Debug, Clone, Serialize, TS)]
pub struct AssignmentOutcome {
    pub assignment: WorkAssignment,
    pub reset_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ChangeResponsibleRequest {
    pub role_type: RoleType,
    pub new_employee_id: String,
    pub change_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ChangeOutcome {
    pub history_id: Uuid,
    pub role_type: RoleType,
    pub role_label: &'static str,
    pub previous_employee_id: Option<String>,
    pub previous_display_name: Option<String>,
    pub new_employee_id: String,
    pub new_display_name: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ChangeHistoryEntry {
    #[serde(flatten)]
    #[ts(flatten)]
    pub change: ResponsibilityChange,
    pub role_label: &'static str,
    pub previous_display_name: Option<String>,
    pub new_display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BulkRowError {
    pub build: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct BulkSummary {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BulkRowError>,
}

fn sanitize_roles(roles: RoleAssignments) -> RoleAssignments {
    fn clean(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
    RoleAssignments {
        accounting: clean(roles.accounting),
        tax_inspection: clean(roles.tax_inspection),
        wht_filer: clean(roles.wht_filer),
        vat_filer: clean(roles.vat_filer),
        document_entry: clean(roles.document_entry),
    }
}

/// Work-assignment lifecycle: create and edit with the best-effort
/// reset cascade, responsibility changes with audit history, manual
/// repair resets, and the bulk-creation job body.
#[derive(Clone)]
pub struct AssignmentService {
    db: DBService,
    cache: ResponseCacheService,
}

impl AssignmentService {
    pub fn new(db: DBService, cache: ResponseCacheService) -> Self {
        Self { db, cache }
    }

    pub async fn get_by_key(
        &self,
        build: &str,
        year: i32,
        month: i32,
    ) -> Result<WorkAssignment, AssignmentError> {
        WorkAssignment::find_by_key(&self.db.conn, build, year, month)
            .await?
            .ok_or(AssignmentError::NotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<WorkAssignment, AssignmentError> {
        WorkAssignment::find_by_uuid(&self.db.conn, id)
            .await?
            .ok_or(AssignmentError::NotFound)
    }

    pub async fn create(
        &self,
        data: CreateWorkAssignment,
        acting_user: Uuid,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let outcome = self.create_inner(data, acting_user).await?;
        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        Ok(outcome)
    }

    async fn create_inner(
        &self,
        mut data: CreateWorkAssignment,
        acting_user: Uuid,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        data.roles = sanitize_roles(data.roles);
        self.validate_month(data.assignment_month)?;
        self.validate_client(&data.build).await?;
        self.validate_employees(&data.roles).await?;

        if WorkAssignment::find_by_key(
            &self.db.conn,
            &data.build,
            data.assignment_year,
            data.assignment_month,
        )
        .await?
        .is_some()
        {
            return Err(AssignmentError::Duplicate);
        }

        let assignment = WorkAssignment::create(&self.db.conn, &data, acting_user)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AssignmentError::Duplicate
                } else {
                    AssignmentError::Database(err)
                }
            })?;

        let reset_error = self.run_reset_cascade(&assignment).await?;
        let assignment = self.get_by_id(assignment.id).await?;
        Ok(AssignmentOutcome {
            assignment,
            reset_error,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        mut data: UpdateWorkAssignment,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        if let Some(roles) = data.roles.take() {
            let roles = sanitize_roles(roles);
            self.validate_employees(&roles).await?;
            data.roles = Some(roles);
        }

        let assignment = WorkAssignment::update(&self.db.conn, id, &data)
            .await
            .map_err(map_not_found)?;
        let reset_error = self.run_reset_cascade(&assignment).await?;
        let assignment = self.get_by_id(assignment.id).await?;

        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        Ok(AssignmentOutcome {
            assignment,
            reset_error,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AssignmentError> {
        WorkAssignment::soft_delete_cascade(&self.db.conn, id)
            .await
            .map_err(map_not_found)?;
        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        self.cache.invalidate(MONTHLY_TAX_CACHE_PATTERN);
        self.cache.invalidate(DOCUMENT_ENTRY_CACHE_PATTERN);
        Ok(())
    }

    /// Manual repair: unlike the cascade run during create/edit, a
    /// failure here is a hard error.
    pub async fn reset_data(&self, id: Uuid) -> Result<WorkAssignment, AssignmentError> {
        let assignment = self.get_by_id(id).await?;
        reset_monthly_data(
            &self.db.conn,
            &assignment.build,
            assignment.assignment_year,
            assignment.assignment_month,
            &assignment.role_assignments(),
        )
        .await?;
        WorkAssignment::mark_reset_completed(&self.db.conn, id, true).await?;
        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        self.get_by_id(id).await
    }

    pub async fn change_responsible(
        &self,
        id: Uuid,
        request: ChangeResponsibleRequest,
        acting_user: Uuid,
    ) -> Result<ChangeOutcome, AssignmentError> {
        let new_employee_id = request.new_employee_id.trim().to_string();
        if new_employee_id.is_empty() {
            return Err(AssignmentError::BlankEmployee);
        }
        let role = request.role_type;

        let new_employee = Employee::find_by_employee_id(&self.db.conn, &new_employee_id)
            .await?
            .ok_or_else(|| AssignmentError::UnknownEmployees(new_employee_id.clone()))?;

        // History, assignment columns and the live monthly row move
        // together or not at all. The current holder is read inside
        // the same transaction so a racing change cannot slip a stale
        // `previous` into the audit row.
        let txn = self.db.conn.begin().await?;
        let assignment = WorkAssignment::find_by_uuid(&txn, id)
            .await?
            .ok_or(AssignmentError::NotFound)?;

        let previous = assignment.role_value(role).map(str::to_string);
        if previous.as_deref() == Some(new_employee_id.as_str()) {
            return Err(AssignmentError::NoOpChange {
                employee_id: new_employee_id,
                role_label: role.label(),
            });
        }
        let change = ResponsibilityChange::append(
            &txn,
            &CreateResponsibilityChange {
                work_assignment_id: assignment.id,
                build: assignment.build.clone(),
                assignment_year: assignment.assignment_year,
                assignment_month: assignment.assignment_month,
                role_type: role,
                previous_employee_id: previous.clone(),
                new_employee_id: new_employee_id.clone(),
                changed_by: acting_user,
                change_reason: request.change_reason.clone(),
            },
        )
        .await?;
        WorkAssignment::set_role(&txn, assignment.id, role, &new_employee_id).await?;
        let patched = MonthlyTaxData::set_role(
            &txn,
            &assignment.build,
            assignment.assignment_year,
            assignment.assignment_month,
            role,
            &new_employee_id,
        )
        .await?;
        txn.commit().await?;

        if patched == 0 {
            tracing::warn!(
                "no live monthly_tax_data row for {} {}/{}; responsibility change recorded on the assignment only",
                assignment.build,
                assignment.assignment_year,
                assignment.assignment_month
            );
        }

        let previous_display_name = match &previous {
            Some(prev) => Employee::find_by_employee_id(&self.db.conn, prev)
                .await?
                .map(|e| e.display_name()),
            None => None,
        };

        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        Ok(ChangeOutcome {
            history_id: change.id,
            role_type: role,
            role_label: role.label(),
            previous_employee_id: previous,
            previous_display_name,
            new_employee_id,
            new_display_name: new_employee.display_name(),
        })
    }

    pub async fn change_history(
        &self,
        id: Uuid,
    ) -> Result<Vec<ChangeHistoryEntry>, AssignmentError> {
        let changes = ResponsibilityChange::list_for_assignment(&self.db.conn, id)
            .await
            .map_err(map_not_found)?;

        let mut ids: Vec<&str> = changes
            .iter()
            .flat_map(|c| {
                [
                    c.previous_employee_id.as_deref(),
                    Some(c.new_employee_id.as_str()),
                ]
            })
            .flatten()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let names = Employee::display_names(&self.db.conn, &ids).await?;

        Ok(changes
            .into_iter()
            .map(|change| {
                let previous_display_name = change
                    .previous_employee_id
                    .as_deref()
                    .and_then(|id| names.get(id).cloned());
                let new_display_name = names.get(change.new_employee_id.as_str()).cloned();
                ChangeHistoryEntry {
                    role_label: change.role_type.label(),
                    previous_display_name,
                    new_display_name,
                    change,
                }
            })
            .collect())
    }

    /// Validates the bulk request shape and hands the per-row work to
    /// the job queue. Row-level validation happens inside the job.
    pub fn enqueue_bulk_create(
        &self,
        queue: &JobQueueService,
        rows: Vec<CreateWorkAssignment>,
        acting_user: Uuid,
    ) -> Result<String, AssignmentError> {
        if rows.is_empty() {
            return Err(AssignmentError::EmptyBulk);
        }
        if rows.len() > BULK_MAX_ROWS {
            return Err(AssignmentError::TooManyRows);
        }
        for row in &rows {
            self.validate_month(row.assignment_month)?;
        }

        let payload = serde_json::json!({
            "row_count": rows.len(),
            "assigned_by": acting_user,
        });
        let service = self.clone();
        let processor: JobProcessor = Box::new(move |progress| {
            Box::pin(async move {
                let summary = service.run_bulk_create(rows, acting_user, progress).await;
                Ok(serde_json::to_value(summary)?)
            })
        });
        Ok(queue.add_job(BULK_CREATE_JOB_TYPE, payload, processor))
    }

    /// One row failing never touches the others; each row is its own
    /// create-plus-cascade unit.
    async fn run_bulk_create(
        &self,
        rows: Vec<CreateWorkAssignment>,
        acting_user: Uuid,
        progress: ProgressHandle,
    ) -> BulkSummary {
        let total = rows.len();
        let mut summary = BulkSummary::default();
        for (i, row) in rows.into_iter().enumerate() {
            progress.update(i + 1, total);
            let build = row.build.clone();
            match self.create_inner(row, acting_user).await {
                // Degraded resets still count as created rows.
                Ok(outcome) => {
                    if let Some(err) = outcome.reset_error {
                        tracing::warn!("bulk row {} created with failed reset: {}", build, err);
                    }
                    summary.success += 1;
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.errors.push(BulkRowError {
                        build,
                        error: err.to_string(),
                    });
                }
            }
        }
        self.cache.invalidate(ASSIGNMENT_CACHE_PATTERN);
        summary
    }

    /// Best-effort cascade after create/edit. Failure downgrades to a
    /// degraded outcome instead of erroring; the row keeps
    /// `is_reset_completed = false` until a manual reset repairs it.
    async fn run_reset_cascade(
        &self,
        assignment: &WorkAssignment,
    ) -> Result<Option<String>, AssignmentError> {
        match reset_monthly_data(
            &self.db.conn,
            &assignment.build,
            assignment.assignment_year,
            assignment.assignment_month,
            &assignment.role_assignments(),
        )
        .await
        {
            Ok(()) => {
                WorkAssignment::mark_reset_completed(&self.db.conn, assignment.id, true).await?;
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(
                    "reset cascade failed for {} {}/{}: {}",
                    assignment.build,
                    assignment.assignment_year,
                    assignment.assignment_month,
                    err
                );
                WorkAssignment::mark_reset_completed(&self.db.conn, assignment.id, false).await?;
                Ok(Some(err.to_string()))
            }
        }
    }

    fn validate_month(&self, month: i32) -> Result<(), AssignmentError> {
        if (1..=12).contains(&month) {
            Ok(())
        } else {
            Err(AssignmentError::InvalidMonth)
        }
    }

    async fn validate_client(&self, build: &str) -> Result<(), AssignmentError> {
        if db::models::client::Client::exists(&self.db.conn, build).await? {
            Ok(())
        } else {
            Err(AssignmentError::UnknownClient(build.to_string()))
        }
    }

    async fn validate_employees(&self, roles: &RoleAssignments) -> Result<(), AssignmentError> {
        let missing = Employee::find_missing(&self.db.conn, &roles.employee_ids()).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssignmentError::UnknownEmployees(missing.join(", ")))
        }
    }
}

fn map_not_found(err: DbErr) -> AssignmentError {
    match err {
        DbErr::RecordNotFound(_) => AssignmentError::NotFound,
        other => AssignmentError::Database(other),
    }
}
