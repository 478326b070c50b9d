//! Consulta de parcelas e download de boletos atrás de um trait

use async_trait::async_trait;
use sost::{Installment, InstallmentKind, SostClient};

#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Parcelas do pagador; vazio ou 404 → `SostError::NotFound`
    async fn list_installments(&self, payer_id: &str, kind: InstallmentKind) -> sost::Result<Vec<Installment>>;

    /// Bytes do PDF do boleto
    async fn fetch_document(
        &self,
        document_number: &str,
        payer_id: &str,
        installment: &str,
    ) -> sost::Result<Vec<u8>>;
}

#[async_trait]
impl BillingProvider for SostClient {
    async fn list_installments(&self, payer_id: &str, kind: InstallmentKind) -> sost::Result<Vec<Installment>> {
        SostClient::list_installments(self, payer_id, kind).await
    }

    async fn fetch_document(
        &self,
        document_number: &str,
        payer_id: &str,
        installment: &str,
    ) -> sost::Result<Vec<u8>> {
        SostClient::fetch_document(self, document_number, payer_id, installment).await
    }
}
