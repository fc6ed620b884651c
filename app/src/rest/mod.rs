use crate::config::Config;
use crate::error::{ApiError, ServiceError};
use crate::models::Store;
use crate::resource::Handlers;
use farmwatch_core::{Principal, UserId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info, info_span, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

mod anomaly_routes;
mod doc_routes;
mod farm_routes;
mod health_routes;
mod plot_routes;
mod reading_routes;
mod recommendation_routes;

pub const USER_HEADER: &str = "x-user-id";
pub const ADMIN_HEADER: &str = "x-user-admin";

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponseDto {
    pub error: String,
}

pub fn routes(
    handlers: &Handlers,
    store: &Arc<dyn Store>,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    farm_routes::routes(&handlers.farms, body_limit)
        .or(plot_routes::routes(&handlers.plots, body_limit))
        .or(reading_routes::routes(&handlers.readings, body_limit))
        .or(anomaly_routes::routes(&handlers.anomalies))
        .or(recommendation_routes::routes(&handlers.recommendations))
        .or(health_routes::routes(store))
        .or(doc_routes::routes())
        .recover(handle_rejection)
        .with(warp::trace(|info| {
            info_span!(
                "request",
                method = %info.method(),
                path = info.path(),
                request_id = %Uuid::new_v4(),
            )
        }))
}

/// Serves until ctrl-c is received
pub async fn dispatch_server(
    config: &Config,
    handlers: Handlers,
    store: Arc<dyn Store>,
) -> Result<(), warp::Error> {
    let routes = routes(&handlers, &store, config.body_limit());
    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(
        config.socket_addr(),
        async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(%err, "Could not listen for ctrl-c");
            }
            info!("Shutting down webserver");
        },
    )?;

    info!(%addr, "Started webserver");
    server.await;
    Ok(())
}

/// Resolves the principal forwarded by the authenticating gateway
pub fn with_principal() -> impl Filter<Extract = (Principal,), Error = Rejection> + Clone {
    warp::header::optional::<String>(USER_HEADER)
        .and(warp::header::optional::<String>(ADMIN_HEADER))
        .and_then(|user_id: Option<String>, admin: Option<String>| async move {
            let user_id = user_id
                .and_then(|id| id.trim().parse::<UserId>().ok())
                .ok_or_else(|| warp::reject::custom(ApiError::Unauthorized))?;
            let is_admin = matches!(
                admin.as_deref().map(str::trim),
                Some("true") | Some("1")
            );
            Ok::<_, Rejection>(Principal::new(user_id, is_admin))
        })
}

pub fn json_body<T: DeserializeOwned + Send>(
    limit: u64,
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(limit).and(warp::body::json())
}

/// Answers every write on a read-only resource with 405
pub fn read_only(
    resource: &'static str,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("api")
        .and(warp::path(resource))
        .and(
            warp::path::param::<i32>()
                .map(Some)
                .or(warp::any().map(|| None))
                .unify(),
        )
        .and(warp::path::end())
        .and(warp::method())
        .and_then(move |_id: Option<i32>, method: Method| async move {
            if method == Method::GET || method == Method::HEAD {
                return Err(warp::reject::not_found());
            }
            let resp: Result<(), ServiceError> =
                Err(ApiError::MethodNotAllowed(method.to_string(), resource).into());
            build_response(resp).map_err(|never| match never {})
        })
        .boxed()
}

pub fn build_response<T: Serialize>(
    resp: Result<T, ServiceError>,
) -> Result<warp::reply::Response, Infallible> {
    build_response_with_status(StatusCode::OK, resp)
}

pub fn build_created<T: Serialize>(
    resp: Result<T, ServiceError>,
) -> Result<warp::reply::Response, Infallible> {
    build_response_with_status(StatusCode::CREATED, resp)
}

pub fn build_deleted(resp: Result<(), ServiceError>) -> Result<warp::reply::Response, Infallible> {
    match resp {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => build_response::<()>(Err(err)),
    }
}

fn build_response_with_status<T: Serialize>(
    status: StatusCode,
    resp: Result<T, ServiceError>,
) -> Result<warp::reply::Response, Infallible> {
    match resp {
        Ok(data) => Ok(warp::reply::with_status(warp::reply::json(&data), status).into_response()),
        Err(ServiceError::User(err)) => {
            warn!(status = err.status().as_u16(), "{}", err);
            Ok(error_response(err.status(), err.to_string()))
        }
        Err(ServiceError::Internal(err)) => {
            error!("{}", err);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> warp::reply::Response {
    let body = ErrorResponseDto { error: message };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Maps rejections to the error body, the most specific cause wins
pub async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, message) = if let Some(api_err) = err.find::<ApiError>() {
        (api_err.status(), api_err.to_string())
    } else if let Some(body_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, body_err.to_string())
    } else if let Some(query_err) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, query_err.to_string())
    } else if let Some(header_err) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, header_err.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_owned())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_owned())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected an application/json body".to_owned(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_owned())
    } else {
        error!(?err, "Unhandled rejection");
        return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    };

    if status.is_client_error() {
        warn!(status = status.as_u16(), "{}", message);
    }
    Ok(error_response(status, message))
}
