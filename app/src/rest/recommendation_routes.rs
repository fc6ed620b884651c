use super::{build_response, read_only, with_principal, ErrorResponseDto};
use crate::resource::RecommendationHandler;
use farmwatch_core::{AgentRecommendation, Principal, RecommendationFilter};
use warp::Filter;

pub fn routes(
    handler: &RecommendationHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_recommendations(handler.clone())
        .or(retrieve_recommendation(handler.clone()))
        .or(read_only("recommendations"))
}

/// GET api/recommendations
#[utoipa::path(
    get,
    path = "/api/recommendations",
    tag = "recommendations",
    params(
        RecommendationFilter,
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Visible recommendations", body = [AgentRecommendation]),
        (status = 401, description = "Missing principal", body = ErrorResponseDto),
    )
)]
fn list_recommendations(
    handler: RecommendationHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "recommendations"))
        .and(warp::get())
        .and(with_principal())
        .and(warp::query::<RecommendationFilter>())
        .and_then(
            |handler: RecommendationHandler,
             principal: Principal,
             filter: RecommendationFilter| async move {
                let resp = handler.list(&principal, filter).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET api/recommendations/:id
#[utoipa::path(
    get,
    path = "/api/recommendations/{id}",
    tag = "recommendations",
    params(
        ("id" = i32, Path, description = "Recommendation id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "The recommendation", body = AgentRecommendation),
        (status = 403, description = "Recommendation of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown recommendation", body = ErrorResponseDto),
    )
)]
fn retrieve_recommendation(
    handler: RecommendationHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "recommendations" / i32))
        .and(warp::get())
        .and(with_principal())
        .and_then(
            |handler: RecommendationHandler, recommendation_id: i32, principal: Principal| async move {
                let resp = handler.retrieve(&principal, recommendation_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{NewAnomaly, NewFarm, NewPlot, NewRecommendation, Store};
    use crate::rest::test::build_mocked_store;
    use crate::rest::{handle_rejection, ADMIN_HEADER, USER_HEADER};
    use farmwatch_core::{AnomalyKind, Severity};

    async fn insert_recommendation(store: &dyn Store, owner: i32) -> AgentRecommendation {
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
        let anomaly = store
            .insert_anomaly(NewAnomaly {
                plot: plot.id,
                anomaly_type: AnomalyKind::TemperatureHigh,
                severity: Severity::High,
                model_confidence: 0.93,
            })
            .await
            .unwrap();
        store
            .insert_recommendation(NewRecommendation {
                anomaly_event: anomaly.id,
                recommended_action: "Increase irrigation".to_owned(),
                explanation_text: "Air temperature above 35 degrees for 3 hours".to_owned(),
                confidence: "high".to_owned(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rest_recommendations_scoped() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let own = insert_recommendation(store.as_ref(), 1).await;
        let foreign = insert_recommendation(store.as_ref(), 2).await;
        let routes = routes(&handlers.recommendations).recover(handle_rejection);

        // Execute
        let listed = warp::test::request()
            .path("/api/recommendations")
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;
        let admin = warp::test::request()
            .path(&format!("/api/recommendations/{}", foreign.id))
            .header(USER_HEADER, "1")
            .header(ADMIN_HEADER, "true")
            .reply(&routes)
            .await;

        // Validate
        let listed: Vec<AgentRecommendation> = serde_json::from_slice(listed.body()).unwrap();
        assert_eq!(vec![own.id], listed.iter().map(|r| r.id).collect::<Vec<_>>());
        assert_eq!(200, admin.status());
    }

    #[tokio::test]
    async fn test_rest_recommendations_are_read_only() {
        let (handlers, store) = build_mocked_store();
        let own = insert_recommendation(store.as_ref(), 1).await;
        let routes = routes(&handlers.recommendations).recover(handle_rejection);

        let res = warp::test::request()
            .method("PATCH")
            .path(&format!("/api/recommendations/{}", own.id))
            .header(USER_HEADER, "1")
            .json(&serde_json::json!({"confidence": "low"}))
            .reply(&routes)
            .await;

        assert_eq!(405, res.status());
        let unchanged = handlers
            .recommendations
            .retrieve(&Principal::user(1), own.id)
            .await
            .unwrap();
        assert_eq!("high", unchanged.confidence);
    }
}
