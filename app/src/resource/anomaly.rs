use super::authorize;
use crate::error::ServiceError;
use crate::models::Store;
use farmwatch_core::{scope, AnomalyEvent, AnomalyFilter, Principal};
use std::sync::Arc;
use tracing::debug;

/// Anomalies are written by the detection model only
#[derive(Clone)]
pub struct AnomalyHandler {
    store: Arc<dyn Store>,
}

impl AnomalyHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        AnomalyHandler { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: AnomalyFilter,
    ) -> Result<Vec<AnomalyEvent>, ServiceError> {
        let anomalies = self.store.anomalies(scope(principal), &filter).await?;
        debug!(count = anomalies.len(), "Listed anomalies");
        Ok(anomalies)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<AnomalyEvent, ServiceError> {
        Ok(authorize(principal, id, self.store.anomaly(id).await?)?)
    }
}
