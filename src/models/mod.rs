pub mod lead_snapshot;
pub mod webhook_payload;

pub use lead_snapshot::LeadSnapshot;
pub use webhook_payload::WebhookPayload;
