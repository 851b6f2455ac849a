use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use crate::entities::{monthly_tax_data, work_assignment};

/// The five responsibility roles carried by every assignment row.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoleType {
    #[sea_orm(string_value = "accounting")]
    Accounting,
    #[sea_orm(string_value = "tax_inspection")]
    TaxInspection,
    #[sea_orm(string_value = "wht_filer")]
    WhtFiler,
    #[sea_orm(string_value = "vat_filer")]
    VatFiler,
    #[sea_orm(string_value = "document_entry")]
    DocumentEntry,
}

impl RoleType {
    pub fn label(&self) -> &'static str {
        match self {
            RoleType::Accounting => "Accounting",
            RoleType::TaxInspection => "Tax Inspection",
            RoleType::WhtFiler => "WHT Filing",
            RoleType::VatFiler => "VAT Filing",
            RoleType::DocumentEntry => "Document Entry",
        }
    }

    /// (main, original, current) columns on `work_assignments`.
    pub fn assignment_columns(
        &self,
    ) -> (
        work_assignment::Column,
        work_assignment::Column,
        work_assignment::Column,
    ) {
        use work_assignment::Column as C;
        match self {
            RoleType::Accounting => (
                C::AccountingResponsible,
                C::OriginalAccountingResponsible,
                C::CurrentAccountingResponsible,
            ),
            RoleType::TaxInspection => (
                C::TaxInspectionResponsible,
                C::OriginalTaxInspectionResponsible,
                C::CurrentTaxInspectionResponsible,
            ),
            RoleType::WhtFiler => (
                C::WhtFilerResponsible,
                C::OriginalWhtFilerResponsible,
                C::CurrentWhtFilerResponsible,
            ),
            RoleType::VatFiler => (
                C::VatFilerResponsible,
                C::OriginalVatFilerResponsible,
                C::CurrentVatFilerResponsible,
            ),
            RoleType::DocumentEntry => (
                C::DocumentEntryResponsible,
                C::OriginalDocumentEntryResponsible,
                C::CurrentDocumentEntryResponsible,
            ),
        }
    }

    /// (main, original, current) columns on `monthly_tax_data`.
    ///
    /// The WHT and VAT filer columns do not follow the
    /// `<role>_responsible` pattern; the filing reports read them under
    /// the `*_employee_id` names, so the mapping lives here instead of
    /// being derived from the role name.
    pub fn monthly_columns(
        &self,
    ) -> (
        monthly_tax_data::Column,
        monthly_tax_data::Column,
        monthly_tax_data::Column,
    ) {
        use monthly_tax_data::Column as C;
        match self {
            RoleType::Accounting => (
                C::AccountingResponsible,
                C::OriginalAccountingResponsible,
                C::CurrentAccountingResponsible,
            ),
            RoleType::TaxInspection => (
                C::TaxInspectionResponsible,
                C::OriginalTaxInspectionResponsible,
                C::CurrentTaxInspectionResponsible,
            ),
            RoleType::WhtFiler => (
                C::WhtFilerEmployeeId,
                C::OriginalWhtFilerEmployeeId,
                C::WhtFilerCurrentEmployeeId,
            ),
            RoleType::VatFiler => (
                C::VatFilerEmployeeId,
                C::OriginalVatFilerEmployeeId,
                C::VatFilerCurrentEmployeeId,
            ),
            RoleType::DocumentEntry => (
                C::DocumentEntryResponsible,
                C::OriginalDocumentEntryResponsible,
                C::CurrentDocumentEntryResponsible,
            ),
        }
    }
}

/// One employee code (or none) per role. Blank strings are sanitized
/// away before this struct is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct RoleAssignments {
    pub accounting: Option<String>,
    pub tax_inspection: Option<String>,
    pub wht_filer: Option<String>,
    pub vat_filer: Option<String>,
    pub document_entry: Option<String>,
}

impl RoleAssignments {
    pub fn get(&self, role: RoleType) -> Option<&str> {
        match role {
            RoleType::Accounting => self.accounting.as_deref(),
            RoleType::TaxInspection => self.tax_inspection.as_deref(),
            RoleType::WhtFiler => self.wht_filer.as_deref(),
            RoleType::VatFiler => self.vat_filer.as_deref(),
            RoleType::DocumentEntry => self.document_entry.as_deref(),
        }
    }

    /// Employee codes referenced by any role, deduplicated.
    pub fn employee_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = [
            self.accounting.as_deref(),
            self.tax_inspection.as_deref(),
            self.wht_filer.as_deref(),
            self.vat_filer.as_deref(),
            self.document_entry.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_type_round_trips_through_snake_case() {
        for role in [
            RoleType::Accounting,
            RoleType::TaxInspection,
            RoleType::WhtFiler,
            RoleType::VatFiler,
            RoleType::DocumentEntry,
        ] {
            let s = role.to_string();
            assert_eq!(RoleType::from_str(&s).unwrap(), role);
        }
        assert!(RoleType::from_str("payroll").is_err());
    }

    #[test]
    fn employee_ids_deduplicates() {
        let roles = RoleAssignments {
            accounting: Some("E001".into()),
            tax_inspection: Some("E002".into()),
            wht_filer: Some("E001".into()),
            vat_filer: None,
            document_entry: Some("E003".into()),
        };
        assert_eq!(roles.employee_ids(), vec!["E001", "E002", "E003"]);
    }
}
