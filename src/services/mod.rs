pub mod billing;
pub mod conversation;
pub mod delivery;
pub mod poller;
pub mod reconciler;
pub mod record_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use billing::BillingProvider;
pub use conversation::ConversationService;
pub use delivery::{DeliveryError, DocumentDelivery};
pub use poller::{PollOutcome, PollingOrchestrator};
pub use reconciler::{reconcile, Action, DELIVERY_SLOTS};
pub use record_store::RecordStore;
