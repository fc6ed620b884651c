use super::{build_response, read_only, with_principal, ErrorResponseDto};
use crate::resource::AnomalyHandler;
use farmwatch_core::{AnomalyEvent, AnomalyFilter, Principal};
use warp::Filter;

/// Anomalies are produced by the detection model, writes are answered with 405
pub fn routes(
    handler: &AnomalyHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_anomalies(handler.clone())
        .or(retrieve_anomaly(handler.clone()))
        .or(read_only("anomalies"))
}

/// GET api/anomalies
#[utoipa::path(
    get,
    path = "/api/anomalies",
    tag = "anomalies",
    params(
        AnomalyFilter,
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Visible anomalies", body = [AnomalyEvent]),
        (status = 401, description = "Missing principal", body = ErrorResponseDto),
    )
)]
fn list_anomalies(
    handler: AnomalyHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "anomalies"))
        .and(warp::get())
        .and(with_principal())
        .and(warp::query::<AnomalyFilter>())
        .and_then(
            |handler: AnomalyHandler, principal: Principal, filter: AnomalyFilter| async move {
                let resp = handler.list(&principal, filter).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET api/anomalies/:id
#[utoipa::path(
    get,
    path = "/api/anomalies/{id}",
    tag = "anomalies",
    params(
        ("id" = i32, Path, description = "Anomaly id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "The anomaly", body = AnomalyEvent),
        (status = 403, description = "Anomaly of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown anomaly", body = ErrorResponseDto),
    )
)]
fn retrieve_anomaly(
    handler: AnomalyHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "anomalies" / i32))
        .and(warp::get())
        .and(with_principal())
        .and_then(
            |handler: AnomalyHandler, anomaly_id: i32, principal: Principal| async move {
                let resp = handler.retrieve(&principal, anomaly_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{NewAnomaly, NewFarm, NewPlot, Store};
    use crate::rest::test::build_mocked_store;
    use crate::rest::{handle_rejection, USER_HEADER};
    use farmwatch_core::{AnomalyKind, Scope, Severity};

    async fn insert_anomaly(store: &dyn Store, owner: i32) -> AnomalyEvent {
        let farm = store
            .insert_farm(NewFarm {
                owner,
                name: "Farm".to_owned(),
                location: "Valley".to_owned(),
                size: 40.0,
                crop_type: "wheat".to_owned(),
            })
            .await
            .unwrap();
        let plot = store
            .insert_plot(NewPlot {
                farm: farm.id,
                name: "North Field".to_owned(),
                crop_variety: "durum".to_owned(),
                size: 3.2,
                location_coordinates: None,
            })
            .await
            .unwrap();
        store
            .insert_anomaly(NewAnomaly {
                plot: plot.id,
                anomaly_type: AnomalyKind::SensorDrift,
                severity: Severity::Low,
                model_confidence: 0.55,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rest_anomalies_are_read_only() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let anomaly = insert_anomaly(store.as_ref(), 1).await;
        let routes = routes(&handlers.anomalies).recover(handle_rejection);

        // Execute
        let post = warp::test::request()
            .method("POST")
            .path("/api/anomalies")
            .header(USER_HEADER, "1")
            .json(&serde_json::json!({
                "plot": anomaly.plot,
                "anomaly_type": "moisture_drop",
                "severity": "high",
                "model_confidence": 0.9,
            }))
            .reply(&routes)
            .await;
        let delete = warp::test::request()
            .method("DELETE")
            .path(&format!("/api/anomalies/{}", anomaly.id))
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(405, post.status());
        assert_eq!(405, delete.status());
        let all = store
            .anomalies(Scope::All, &AnomalyFilter::default())
            .await
            .unwrap();
        assert_eq!(1, all.len());
    }

    #[tokio::test]
    async fn test_rest_list_anomalies_scoped() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let own = insert_anomaly(store.as_ref(), 1).await;
        let foreign = insert_anomaly(store.as_ref(), 2).await;
        let routes = routes(&handlers.anomalies).recover(handle_rejection);

        // Execute
        let listed = warp::test::request()
            .path("/api/anomalies?severity=low")
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;
        let denied = warp::test::request()
            .path(&format!("/api/anomalies/{}", foreign.id))
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(200, listed.status());
        let listed: Vec<AnomalyEvent> = serde_json::from_slice(listed.body()).unwrap();
        assert_eq!(vec![own.id], listed.iter().map(|a| a.id).collect::<Vec<_>>());
        assert_eq!(403, denied.status());
    }
}
