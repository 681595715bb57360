use compliance::{ComplianceConfig, ComplianceService};
use persistence::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub compliance_config: Arc<ComplianceConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, compliance_config: ComplianceConfig) -> Self {
        Self {
            store,
            compliance_config: Arc::new(compliance_config),
        }
    }

    /// Compliance service bound to this state's store
    pub fn compliance(&self) -> ComplianceService<dyn Store> {
        ComplianceService::new(Arc::clone(&self.store), Arc::clone(&self.compliance_config))
    }
}
