use super::{
    build_created, build_deleted, build_response, json_body, with_principal, ErrorResponseDto,
};
use crate::resource::payload::{PlotPatch, PlotPayload};
use crate::resource::PlotHandler;
use farmwatch_core::{FieldPlot, PlotFilter, Principal};
use warp::Filter;

pub fn routes(
    handler: &PlotHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_plots(handler.clone())
        .or(create_plot(handler.clone(), body_limit))
        .or(retrieve_plot(handler.clone()))
        .or(update_plot(handler.clone(), body_limit))
        .or(patch_plot(handler.clone(), body_limit))
        .or(delete_plot(handler.clone()))
}

/// GET api/plots
#[utoipa::path(
    get,
    path = "/api/plots",
    tag = "plots",
    params(
        PlotFilter,
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Visible plots", body = [FieldPlot]),
        (status = 401, description = "Missing principal", body = ErrorResponseDto),
    )
)]
fn list_plots(
    handler: PlotHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots"))
        .and(warp::get())
        .and(with_principal())
        .and(warp::query::<PlotFilter>())
        .and_then(
            |handler: PlotHandler, principal: Principal, filter: PlotFilter| async move {
                let resp = handler.list(&principal, filter).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// POST api/plots
///
/// Creates a plot on the caller's farm. A `farm` in the body is only
/// honoured for administrators, who have to name one.
#[utoipa::path(
    post,
    path = "/api/plots",
    tag = "plots",
    request_body = PlotPayload,
    params(("x-user-id" = i32, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Created plot", body = FieldPlot),
        (status = 400, description = "Invalid payload or caller without farm", body = ErrorResponseDto),
    )
)]
fn create_plot(
    handler: PlotHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots"))
        .and(warp::post())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: PlotHandler, principal: Principal, body: PlotPayload| async move {
                let resp = handler.create(&principal, body).await;
                build_created(resp)
            },
        )
        .boxed()
}

/// GET api/plots/:id
#[utoipa::path(
    get,
    path = "/api/plots/{id}",
    tag = "plots",
    params(
        ("id" = i32, Path, description = "Plot id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "The plot", body = FieldPlot),
        (status = 403, description = "Plot of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown plot", body = ErrorResponseDto),
    )
)]
fn retrieve_plot(
    handler: PlotHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots" / i32))
        .and(warp::get())
        .and(with_principal())
        .and_then(
            |handler: PlotHandler, plot_id: i32, principal: Principal| async move {
                let resp = handler.retrieve(&principal, plot_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PUT api/plots/:id
///
/// A plot never moves to another farm, `farm` is ignored
#[utoipa::path(
    put,
    path = "/api/plots/{id}",
    tag = "plots",
    request_body = PlotPayload,
    params(
        ("id" = i32, Path, description = "Plot id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated plot", body = FieldPlot),
        (status = 403, description = "Plot of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown plot", body = ErrorResponseDto),
    )
)]
fn update_plot(
    handler: PlotHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots" / i32))
        .and(warp::put())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: PlotHandler, plot_id: i32, principal: Principal, body: PlotPayload| async move {
                let resp = handler.update(&principal, plot_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PATCH api/plots/:id
#[utoipa::path(
    patch,
    path = "/api/plots/{id}",
    tag = "plots",
    request_body = PlotPatch,
    params(
        ("id" = i32, Path, description = "Plot id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated plot", body = FieldPlot),
        (status = 403, description = "Plot of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown plot", body = ErrorResponseDto),
    )
)]
fn patch_plot(
    handler: PlotHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots" / i32))
        .and(warp::patch())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: PlotHandler, plot_id: i32, principal: Principal, body: PlotPatch| async move {
                let resp = handler.partial_update(&principal, plot_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// DELETE api/plots/:id
#[utoipa::path(
    delete,
    path = "/api/plots/{id}",
    tag = "plots",
    params(
        ("id" = i32, Path, description = "Plot id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 204, description = "Plot deleted"),
        (status = 403, description = "Plot of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown plot", body = ErrorResponseDto),
    )
)]
fn delete_plot(
    handler: PlotHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "plots" / i32))
        .and(warp::delete())
        .and(with_principal())
        .and_then(
            |handler: PlotHandler, plot_id: i32, principal: Principal| async move {
                let resp = handler.delete(&principal, plot_id).await;
                build_deleted(resp)
            },
        )
        .boxed()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{NewFarm, Store};
    use crate::rest::test::build_mocked_store;
    use crate::rest::{handle_rejection, ADMIN_HEADER, USER_HEADER};

    async fn insert_farm(store: &dyn Store, owner: i32) -> i32 {
        store
            .insert_farm(NewFarm {
                owner,
                name: format!("Farm of {}", owner),
                location: "Valley".to_owned(),
                size: 40.0,
                crop_type: "wheat".to_owned(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_rest_plot_is_attached_to_own_farm() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let farm_id = insert_farm(store.as_ref(), 1).await;
        let routes = routes(&handlers.plots, 4096).recover(handle_rejection);

        // Execute
        let res = warp::test::request()
            .method("POST")
            .path("/api/plots")
            .header(USER_HEADER, "1")
            .json(&serde_json::json!({
                "name": "North Field",
                "crop_variety": "durum",
                "size": 3.2,
                "farm": 99,
            }))
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(201, res.status());
        let plot: FieldPlot = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(farm_id, plot.farm);
        assert_eq!("North Field", plot.name);
    }

    #[tokio::test]
    async fn test_rest_plot_without_farm() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let routes = routes(&handlers.plots, 4096).recover(handle_rejection);

        // Execute
        let res = warp::test::request()
            .method("POST")
            .path("/api/plots")
            .header(USER_HEADER, "3")
            .json(&serde_json::json!({
                "name": "North Field",
                "crop_variety": "durum",
                "size": 3.2,
            }))
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(400, res.status());
        let err: ErrorResponseDto = serde_json::from_slice(res.body()).unwrap();
        assert_eq!("No farm found for this user.", err.error);
        let plots = store
            .plots(farmwatch_core::Scope::All, &PlotFilter::default())
            .await
            .unwrap();
        assert!(plots.is_empty());
    }

    #[tokio::test]
    async fn test_rest_admin_plot_needs_farm() {
        let (handlers, store) = build_mocked_store();
        let farm_id = insert_farm(store.as_ref(), 2).await;
        let routes = routes(&handlers.plots, 4096).recover(handle_rejection);
        let body = serde_json::json!({
            "name": "South Field",
            "crop_variety": "spelt",
            "size": 1.0,
        });

        let missing = warp::test::request()
            .method("POST")
            .path("/api/plots")
            .header(USER_HEADER, "1")
            .header(ADMIN_HEADER, "true")
            .json(&body)
            .reply(&routes)
            .await;
        let mut named = body.clone();
        named["farm"] = serde_json::json!(farm_id);
        let created = warp::test::request()
            .method("POST")
            .path("/api/plots")
            .header(USER_HEADER, "1")
            .header(ADMIN_HEADER, "true")
            .json(&named)
            .reply(&routes)
            .await;

        assert_eq!(400, missing.status());
        assert_eq!(201, created.status());
        let plot: FieldPlot = serde_json::from_slice(created.body()).unwrap();
        assert_eq!(farm_id, plot.farm);
    }

    #[tokio::test]
    async fn test_rest_list_plots_by_farm() {
        // Prepare
        let (handlers, store) = build_mocked_store();
        let own_farm = insert_farm(store.as_ref(), 1).await;
        let other_farm = insert_farm(store.as_ref(), 2).await;
        for (owner, name) in [(1, "North"), (1, "East"), (2, "South")] {
            handlers
                .plots
                .create(
                    &Principal::user(owner),
                    PlotPayload {
                        farm: None,
                        name: name.to_owned(),
                        crop_variety: "durum".to_owned(),
                        size: 1.0,
                        location_coordinates: None,
                    },
                )
                .await
                .unwrap();
        }
        let routes = routes(&handlers.plots, 4096).recover(handle_rejection);

        // Execute
        let own = warp::test::request()
            .path(&format!("/api/plots?farm={}", own_farm))
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;
        let foreign = warp::test::request()
            .path(&format!("/api/plots?farm={}", other_farm))
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(200, own.status());
        let own: Vec<FieldPlot> = serde_json::from_slice(own.body()).unwrap();
        assert_eq!(2, own.len());
        let foreign: Vec<FieldPlot> = serde_json::from_slice(foreign.body()).unwrap();
        assert!(foreign.is_empty());
    }

    #[tokio::test]
    async fn test_rest_invalid_query() {
        let (handlers, _) = build_mocked_store();
        let routes = routes(&handlers.plots, 4096).recover(handle_rejection);

        let res = warp::test::request()
            .path("/api/plots?farm=north")
            .header(USER_HEADER, "1")
            .reply(&routes)
            .await;

        assert_eq!(400, res.status());
    }
}
