use crate::error::ApiError;
use crate::models::Store;
use farmwatch_core::{can_access, Principal, Scoped};
use std::sync::Arc;
use tracing::debug;

pub mod assign;
pub mod payload;

mod anomaly;
mod farm;
mod plot;
mod reading;
mod recommendation;

pub use anomaly::AnomalyHandler;
pub use farm::FarmHandler;
pub use plot::PlotHandler;
pub use reading::ReadingHandler;
pub use recommendation::RecommendationHandler;

/// Object level gate, a missing record is reported before a foreign one
pub fn authorize<T: Scoped>(
    principal: &Principal,
    id: i32,
    record: Option<T>,
) -> Result<T, ApiError> {
    let record = record.ok_or(ApiError::NotFound(T::RESOURCE, id))?;
    if !can_access(principal, &record) {
        debug!(
            user_id = principal.user_id(),
            resource = T::RESOURCE,
            id,
            "Denied access"
        );
        return Err(ApiError::Forbidden(T::RESOURCE, id));
    }
    Ok(record)
}

/// All resource handlers over one shared store
#[derive(Clone)]
pub struct Handlers {
    pub farms: FarmHandler,
    pub plots: PlotHandler,
    pub readings: ReadingHandler,
    pub anomalies: AnomalyHandler,
    pub recommendations: RecommendationHandler,
}

impl Handlers {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Handlers {
            farms: FarmHandler::new(store.clone()),
            plots: PlotHandler::new(store.clone()),
            readings: ReadingHandler::new(store.clone()),
            anomalies: AnomalyHandler::new(store.clone()),
            recommendations: RecommendationHandler::new(store),
        }
    }
}
