//! Database access for leads-api
//!
//! Schema creation lives in `leads_common::db`; this module holds the
//! queries the HTTP handlers and the CSV importer run.

pub mod import_reports;
pub mod leads;
