//! Cliente da API de boletos SOST
//!
//! - `GET /parcelas/{documento}/{tipo}`: parcelas do pagador (`a_vencer`, `vencidos`, `todos`)
//! - `GET /boleto/{numnota}/{documento}/{parcela}`: PDF do boleto
//!
//! Todas as chamadas usam o header `X-API-KEY`.

pub mod client;
pub mod error;
pub mod types;

pub use client::SostClient;
pub use error::{Result, SostError};
pub use types::{Installment, InstallmentKind};

/// Um PDF válido começa com `%PDF`; a SOST às vezes devolve um JSON de erro
/// com status 200 no lugar do binário.
pub fn is_error_document(bytes: &[u8]) -> bool {
    matches!(bytes.first(), None | Some(b'{') | Some(b'['))
}
