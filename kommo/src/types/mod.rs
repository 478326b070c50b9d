//! Tipos da API Kommo usados pela integração

pub mod custom_field;
pub mod drive;
pub mod lead;

pub use custom_field::{CustomFieldValues, FieldUpdate, FieldValue, FileFieldValue};
pub use drive::{Account, UploadReceipt, UploadSession};
pub use lead::Lead;
