use super::{
    build_created, build_deleted, build_response, json_body, with_principal, ErrorResponseDto,
};
use crate::resource::payload::{FarmPatch, FarmPayload};
use crate::resource::FarmHandler;
use farmwatch_core::{FarmFilter, FarmProfile, Principal};
use warp::Filter;

pub fn routes(
    handler: &FarmHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_farms(handler.clone())
        .or(create_farm(handler.clone(), body_limit))
        .or(retrieve_farm(handler.clone()))
        .or(update_farm(handler.clone(), body_limit))
        .or(patch_farm(handler.clone(), body_limit))
        .or(delete_farm(handler.clone()))
}

/// GET api/farms
///
/// Lists the farms visible to the caller, administrators see all of them
#[utoipa::path(
    get,
    path = "/api/farms",
    tag = "farms",
    params(
        FarmFilter,
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Visible farms", body = [FarmProfile]),
        (status = 401, description = "Missing principal", body = ErrorResponseDto),
    )
)]
fn list_farms(
    handler: FarmHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms"))
        .and(warp::get())
        .and(with_principal())
        .and(warp::query::<FarmFilter>())
        .and_then(
            |handler: FarmHandler, principal: Principal, filter: FarmFilter| async move {
                let resp = handler.list(&principal, filter).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// POST api/farms
///
/// Creates a farm. The owner is the caller unless an administrator names
/// someone else. Every user owns at most one farm.
#[utoipa::path(
    post,
    path = "/api/farms",
    tag = "farms",
    request_body = FarmPayload,
    params(("x-user-id" = i32, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Created farm", body = FarmProfile),
        (status = 400, description = "Invalid payload or second farm", body = ErrorResponseDto),
    )
)]
fn create_farm(
    handler: FarmHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms"))
        .and(warp::post())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: FarmHandler, principal: Principal, body: FarmPayload| async move {
                let resp = handler.create(&principal, body).await;
                build_created(resp)
            },
        )
        .boxed()
}

/// GET api/farms/:id
#[utoipa::path(
    get,
    path = "/api/farms/{id}",
    tag = "farms",
    params(
        ("id" = i32, Path, description = "Farm id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "The farm", body = FarmProfile),
        (status = 403, description = "Farm of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown farm", body = ErrorResponseDto),
    )
)]
fn retrieve_farm(
    handler: FarmHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms" / i32))
        .and(warp::get())
        .and(with_principal())
        .and_then(
            |handler: FarmHandler, farm_id: i32, principal: Principal| async move {
                let resp = handler.retrieve(&principal, farm_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PUT api/farms/:id
///
/// Replaces all editable fields, the owner never changes
#[utoipa::path(
    put,
    path = "/api/farms/{id}",
    tag = "farms",
    request_body = FarmPayload,
    params(
        ("id" = i32, Path, description = "Farm id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated farm", body = FarmProfile),
        (status = 403, description = "Farm of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown farm", body = ErrorResponseDto),
    )
)]
fn update_farm(
    handler: FarmHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms" / i32))
        .and(warp::put())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: FarmHandler, farm_id: i32, principal: Principal, body: FarmPayload| async move {
                let resp = handler.update(&principal, farm_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PATCH api/farms/:id
#[utoipa::path(
    patch,
    path = "/api/farms/{id}",
    tag = "farms",
    request_body = FarmPatch,
    params(
        ("id" = i32, Path, description = "Farm id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated farm", body = FarmProfile),
        (status = 403, description = "Farm of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown farm", body = ErrorResponseDto),
    )
)]
fn patch_farm(
    handler: FarmHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms" / i32))
        .and(warp::patch())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: FarmHandler, farm_id: i32, principal: Principal, body: FarmPatch| async move {
                let resp = handler.partial_update(&principal, farm_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// DELETE api/farms/:id
///
/// Deletes the farm with all of its plots, readings, anomalies and recommendations
#[utoipa::path(
    delete,
    path = "/api/farms/{id}",
    tag = "farms",
    params(
        ("id" = i32, Path, description = "Farm id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 204, description = "Farm deleted"),
        (status = 403, description = "Farm of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown farm", body = ErrorResponseDto),
    )
)]
fn delete_farm(
    handler: FarmHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "farms" / i32))
        .and(warp::delete())
        .and(with_principal())
        .and_then(
            |handler: FarmHandler, farm_id: i32, principal: Principal| async move {
                let resp = handler.delete(&principal, farm_id).await;
                build_deleted(resp)
            },
        )
        .boxed()
}
