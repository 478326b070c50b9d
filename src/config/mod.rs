pub mod settings;

pub use settings::{ConversationSettings, FieldMap, PollingSettings, Settings};
