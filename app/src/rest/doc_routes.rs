use super::health_routes::HealthyDto;
use super::{
    anomaly_routes, farm_routes, health_routes, plot_routes, reading_routes,
    recommendation_routes, ErrorResponseDto,
};
use crate::resource::payload::{
    FarmPatch, FarmPayload, PlotPatch, PlotPayload, ReadingPatch, ReadingPayload,
};
use farmwatch_core::{
    AgentRecommendation, AnomalyEvent, AnomalyKind, FarmProfile, FieldPlot, SensorKind,
    SensorReading, Severity,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::Config;
use warp::{
    http::Uri,
    hyper::{Response, StatusCode},
    path::{FullPath, Tail},
    Filter, Rejection, Reply,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        farm_routes::list_farms,
        farm_routes::create_farm,
        farm_routes::retrieve_farm,
        farm_routes::update_farm,
        farm_routes::patch_farm,
        farm_routes::delete_farm,
        plot_routes::list_plots,
        plot_routes::create_plot,
        plot_routes::retrieve_plot,
        plot_routes::update_plot,
        plot_routes::patch_plot,
        plot_routes::delete_plot,
        reading_routes::list_readings,
        reading_routes::create_reading,
        reading_routes::retrieve_reading,
        reading_routes::update_reading,
        reading_routes::patch_reading,
        reading_routes::delete_reading,
        anomaly_routes::list_anomalies,
        anomaly_routes::retrieve_anomaly,
        recommendation_routes::list_recommendations,
        recommendation_routes::retrieve_recommendation,
        health_routes::health,
    ),
    components(schemas(
        FarmProfile,
        FieldPlot,
        SensorReading,
        AnomalyEvent,
        AgentRecommendation,
        SensorKind,
        AnomalyKind,
        Severity,
        FarmPayload,
        FarmPatch,
        PlotPayload,
        PlotPatch,
        ReadingPayload,
        ReadingPatch,
        ErrorResponseDto,
        HealthyDto,
    )),
    tags(
        (name = "farms", description = "Farm profiles, one per user"),
        (name = "plots", description = "Field plots of a farm"),
        (name = "readings", description = "Sensor readings of a plot"),
        (name = "anomalies", description = "Anomalies reported by the detection model"),
        (name = "recommendations", description = "Advice of the recommendation agent"),
        (name = "health", description = "Service state"),
    )
)]
pub struct ApiDoc;

static API_DOC: Lazy<utoipa::openapi::OpenApi> = Lazy::new(ApiDoc::openapi);

/// GET api/doc/api.json and the swagger UI below api/doc
pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let config = Arc::new(Config::new(["/api/doc/api.json"]));

    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(|| warp::reply::json(&*API_DOC))
        .or(warp::path("api")
            .and(warp::path("doc"))
            .and(warp::get())
            .and(warp::path::full())
            .and(warp::path::tail())
            .and(warp::any().map(move || config.clone()))
            .and_then(serve_swagger))
        .boxed()
}

async fn serve_swagger(
    full_path: FullPath,
    tail: Tail,
    config: Arc<Config<'static>>,
) -> Result<Box<dyn Reply + 'static>, Rejection> {
    if full_path.as_str() == "/api/doc" {
        return Ok(Box::new(warp::redirect::found(Uri::from_static(
            "/api/doc/",
        ))));
    }

    match utoipa_swagger_ui::serve(tail.as_str(), config) {
        Ok(Some(file)) => Ok(Box::new(
            Response::builder()
                .header("Content-Type", file.content_type)
                .body(file.bytes),
        )),
        Ok(None) => Err(warp::reject::not_found()),
        Err(error) => Ok(Box::new(
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(error.to_string()),
        )),
    }
}
