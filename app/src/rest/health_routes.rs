use super::build_response;
use crate::models::Store;
use std::sync::Arc;
use tracing::warn;
use warp::Filter;

pub fn routes(
    store: &Arc<dyn Store>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(store.clone())
}

/// GET api/health
///
/// Unauthenticated liveness probe, reports the state of the store
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service state", body = HealthyDto))
)]
fn health(
    store: Arc<dyn Store>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::path!("api" / "health"))
        .and(warp::get())
        .and_then(|store: Arc<dyn Store>| async move {
            let (healthy, database_state) = match store.check().await {
                Ok(()) => (true, "ok".to_owned()),
                Err(err) => {
                    warn!(%err, "Store check failed");
                    (false, err.to_string())
                }
            };
            let farm_count = if healthy {
                store.count_farms().await.ok()
            } else {
                None
            };

            let ret = dto::HealthyDto {
                healthy,
                store: store.backend().to_owned(),
                database_state,
                farm_count,
            };
            build_response(Ok(ret))
        })
        .boxed()
}

pub use dto::HealthyDto;

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct HealthyDto {
        pub healthy: bool,
        /// `postgres` or `memory`
        pub store: String,
        pub database_state: String,
        pub farm_count: Option<i64>,
    }
}
