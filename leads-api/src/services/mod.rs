//! Business logic behind the HTTP handlers

pub mod csv_import;
pub mod gender_enrichment;
pub mod genderize_client;
pub mod lead_rows;
pub mod message_template;

pub use csv_import::{CsvImporter, ImportOutcome, ImportResult, UploadedCsv, MAX_UPLOAD_BYTES};
pub use gender_enrichment::{guess_genders, GenderResult};
pub use genderize_client::{GenderPrediction, GenderizeClient, GenderizeError};
pub use message_template::{MessageTemplate, TemplateError};
