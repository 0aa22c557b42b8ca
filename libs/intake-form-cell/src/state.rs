use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use shared_config::AppConfig;

use crate::services::ai::IntakeAiClient;
use crate::services::reconciler::FieldMappingReconciler;

/// Shared state for the intake cell: one reconciler per form session, keyed
/// by form id. Reconcilers are only ever touched under the lock; the lock is
/// released across AI round trips.
pub struct IntakeState {
    pub config: Arc<AppConfig>,
    pub ai: IntakeAiClient,
    pub sessions: Mutex<BTreeMap<String, FieldMappingReconciler>>,
}

impl IntakeState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            ai: IntakeAiClient::new(&config),
            config,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }
}
