//! Cliente da API Kommo
//!
//! Cobre apenas o que a integração de boletos precisa:
//!
//! - **Leads**: leitura do lead com `custom_fields_values` e PATCH parcial de campos
//! - **Kommo Drive**: descoberta do `drive_url`, sessão de upload e envio dos bytes
//! - **Notas**: nota de anexo (`note_type = "attachment"`) no lead
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use kommo::{KommoClient, types::FieldUpdate};
//!
//! #[tokio::main]
//! async fn main() -> kommo::Result<()> {
//!     let subdomain = std::env::var("KOMMO_SUBDOMAIN").expect("KOMMO_SUBDOMAIN não configurado");
//!     let token = std::env::var("KOMMO_ACCESS_TOKEN").expect("KOMMO_ACCESS_TOKEN não configurado");
//!
//!     let client = KommoClient::new(&subdomain, token)?;
//!     let lead = client.get_lead(12345).await?;
//!     client.update_lead_fields(lead.id, &[FieldUpdate::clear(1299400)]).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod drive;
pub mod error;
pub mod leads;
pub mod notes;
pub mod types;

pub use client::KommoClient;
pub use error::{KommoError, Result};
