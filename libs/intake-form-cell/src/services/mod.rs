pub mod ai;
pub mod reconciler;

pub use ai::IntakeAiClient;
pub use reconciler::{FieldMappingReconciler, SuggestionRequest};
