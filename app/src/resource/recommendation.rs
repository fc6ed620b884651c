use super::authorize;
use crate::error::ServiceError;
use crate::models::Store;
use farmwatch_core::{scope, AgentRecommendation, Principal, RecommendationFilter};
use std::sync::Arc;
use tracing::debug;

/// Recommendations are written by the recommendation agent only
#[derive(Clone)]
pub struct RecommendationHandler {
    store: Arc<dyn Store>,
}

impl RecommendationHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        RecommendationHandler { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: RecommendationFilter,
    ) -> Result<Vec<AgentRecommendation>, ServiceError> {
        let recommendations = self
            .store
            .recommendations(scope(principal), &filter)
            .await?;
        debug!(count = recommendations.len(), "Listed recommendations");
        Ok(recommendations)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<AgentRecommendation, ServiceError> {
        Ok(authorize(principal, id, self.store.recommendation(id).await?)?)
    }
}
