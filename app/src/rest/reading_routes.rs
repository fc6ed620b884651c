use super::{
    build_created, build_deleted, build_response, json_body, with_principal, ErrorResponseDto,
};
use crate::resource::payload::{ReadingPatch, ReadingPayload};
use crate::resource::ReadingHandler;
use farmwatch_core::{Principal, ReadingFilter, SensorReading};
use warp::Filter;

pub fn routes(
    handler: &ReadingHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    list_readings(handler.clone())
        .or(create_reading(handler.clone(), body_limit))
        .or(retrieve_reading(handler.clone()))
        .or(update_reading(handler.clone(), body_limit))
        .or(patch_reading(handler.clone(), body_limit))
        .or(delete_reading(handler.clone()))
}

/// GET api/readings
///
/// Returns the visible readings, most recent first
#[utoipa::path(
    get,
    path = "/api/readings",
    tag = "readings",
    params(
        ReadingFilter,
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Visible readings", body = [SensorReading]),
        (status = 401, description = "Missing principal", body = ErrorResponseDto),
    )
)]
fn list_readings(
    handler: ReadingHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings"))
        .and(warp::get())
        .and(with_principal())
        .and(warp::query::<ReadingFilter>())
        .and_then(
            |handler: ReadingHandler, principal: Principal, filter: ReadingFilter| async move {
                let resp = handler.list(&principal, filter).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// POST api/readings
///
/// Stores a reading for a plot the caller may access
#[utoipa::path(
    post,
    path = "/api/readings",
    tag = "readings",
    request_body = ReadingPayload,
    params(("x-user-id" = i32, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Stored reading", body = SensorReading),
        (status = 400, description = "Invalid payload or unknown plot", body = ErrorResponseDto),
        (status = 403, description = "Plot of another user", body = ErrorResponseDto),
    )
)]
fn create_reading(
    handler: ReadingHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings"))
        .and(warp::post())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: ReadingHandler, principal: Principal, body: ReadingPayload| async move {
                let resp = handler.create(&principal, body).await;
                build_created(resp)
            },
        )
        .boxed()
}

/// GET api/readings/:id
#[utoipa::path(
    get,
    path = "/api/readings/{id}",
    tag = "readings",
    params(
        ("id" = i32, Path, description = "Reading id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "The reading", body = SensorReading),
        (status = 403, description = "Reading of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown reading", body = ErrorResponseDto),
    )
)]
fn retrieve_reading(
    handler: ReadingHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings" / i32))
        .and(warp::get())
        .and(with_principal())
        .and_then(
            |handler: ReadingHandler, reading_id: i32, principal: Principal| async move {
                let resp = handler.retrieve(&principal, reading_id).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PUT api/readings/:id
#[utoipa::path(
    put,
    path = "/api/readings/{id}",
    tag = "readings",
    request_body = ReadingPayload,
    params(
        ("id" = i32, Path, description = "Reading id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated reading", body = SensorReading),
        (status = 403, description = "Reading of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown reading", body = ErrorResponseDto),
    )
)]
fn update_reading(
    handler: ReadingHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings" / i32))
        .and(warp::put())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: ReadingHandler,
             reading_id: i32,
             principal: Principal,
             body: ReadingPayload| async move {
                let resp = handler.update(&principal, reading_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PATCH api/readings/:id
#[utoipa::path(
    patch,
    path = "/api/readings/{id}",
    tag = "readings",
    request_body = ReadingPatch,
    params(
        ("id" = i32, Path, description = "Reading id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated reading", body = SensorReading),
        (status = 403, description = "Reading of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown reading", body = ErrorResponseDto),
    )
)]
fn patch_reading(
    handler: ReadingHandler,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings" / i32))
        .and(warp::patch())
        .and(with_principal())
        .and(json_body(body_limit))
        .and_then(
            |handler: ReadingHandler,
             reading_id: i32,
             principal: Principal,
             body: ReadingPatch| async move {
                let resp = handler.partial_update(&principal, reading_id, body).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// DELETE api/readings/:id
#[utoipa::path(
    delete,
    path = "/api/readings/{id}",
    tag = "readings",
    params(
        ("id" = i32, Path, description = "Reading id"),
        ("x-user-id" = i32, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 204, description = "Reading deleted"),
        (status = 403, description = "Reading of another user", body = ErrorResponseDto),
        (status = 404, description = "Unknown reading", body = ErrorResponseDto),
    )
)]
fn delete_reading(
    handler: ReadingHandler,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || handler.clone())
        .and(warp::path!("api" / "readings" / i32))
        .and(warp::delete())
        .and(with_principal())
        .and_then(
            |handler: ReadingHandler, reading_id: i32, principal: Principal| async move {
                let resp = handler.delete(&principal, reading_id).await;
                build_deleted(resp)
            },
        )
        .boxed()
}
