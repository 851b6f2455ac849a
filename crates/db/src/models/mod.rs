pub mod client;
pub mod document_entry_work;
pub mod employee;
pub mod ids;
pub mod monthly_tax_data;
pub mod reset;
pub mod responsibility_change_history;
pub mod work_assignment;

#[cfg(test)]
pub(crate) mod test_support;
