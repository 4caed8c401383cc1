use std::sync::Arc;

use tracing::warn;

use crate::models::solar::CalculationRecord;
use crate::services::calculation_store::CalculationStore;
use crate::services::solar_calculator::SolarCalculator;

#[derive(Clone)]
pub struct AppState {
    /// Stateless engine, shared by every request
    pub calculator: Arc<SolarCalculator>,
    /// Analytics history
    pub store: Arc<dyn CalculationStore>,
}

impl AppState {
    pub fn new(calculator: SolarCalculator, store: Arc<dyn CalculationStore>) -> Self {
        Self { calculator: Arc::new(calculator), store }
    }

    /// Fire-and-forget write. The response never waits on it and a failure
    /// is only logged.
    pub fn record_in_background(&self, record: CalculationRecord) {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let id = record.id;
            if let Err(e) = store.record(record) {
                warn!(%id, backend = store.backend(), error = %e, "failed to store calculation");
            }
        });
    }
}
