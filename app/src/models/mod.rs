use crate::config::Config;
use crate::error::DBError;
use async_trait::async_trait;
use farmwatch_core::*;
use std::sync::Arc;
use tracing::{info, warn};

macro_rules! sql_stmnt {
    ($ret:ident, $stmt:expr) => {
        sqlx::query_as::<_, $ret>($stmt)
    };
    ($stmt:expr) => {
        sqlx::query($stmt)
    };
    ($ret:ident, $stmt:expr, $($bind:expr),*) => {
        sqlx::query_as::<_, $ret>($stmt)$(.bind($bind))*
    };
    ($stmt:expr, $($bind:expr),*) => {
        sqlx::query($stmt)$(.bind($bind))*
    };
}

pub async fn establish_db_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<sqlx::PgPool, DBError> {
    Ok(sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?)
}

pub async fn run_migrations(conn: &sqlx::PgPool) -> Result<(), DBError> {
    sqlx::migrate!("./migrations").run(conn).await?;
    Ok(())
}

pub async fn check_schema(conn: &sqlx::PgPool) -> Result<(), DBError> {
    sql_stmnt!("SELECT count(*) as count FROM farm_profiles")
        .fetch_one(conn)
        .await?;
    Ok(())
}

/// Picks the store backend: Postgres if a database is configured, otherwise in-memory
pub async fn connect_store(config: &Config) -> Result<Arc<dyn Store>, DBError> {
    match config.database_url() {
        Some(url) => {
            let conn = establish_db_connection(url, config.database_max_connections()).await?;
            if config.run_migrations() {
                run_migrations(&conn).await?;
                info!("Applied database migrations");
            }
            check_schema(&conn).await?;
            info!("Connected to database");
            Ok(Arc::new(PgStore::new(conn)))
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRecord {
    pub count: Option<i64>,
}

impl CountRecord {
    pub fn count(self) -> i64 {
        self.count.unwrap_or(0)
    }
}

/// Escapes a search term for an ILIKE substring match
pub(crate) fn like_pattern(term: &Option<String>) -> Option<String> {
    term.as_ref().map(|term| {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

//
// Store inputs, produced after validation and auto-assignment
//

#[derive(Debug, Clone, PartialEq)]
pub struct NewFarm {
    pub owner: UserId,
    pub name: String,
    pub location: String,
    pub size: f64,
    pub crop_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmUpdate {
    pub name: String,
    pub location: String,
    pub size: f64,
    pub crop_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlot {
    pub farm: i32,
    pub name: String,
    pub crop_variety: String,
    pub size: f64,
    pub location_coordinates: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotUpdate {
    pub name: String,
    pub crop_variety: String,
    pub size: f64,
    pub location_coordinates: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub plot: i32,
    pub sensor_type: SensorKind,
    pub value: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingUpdate {
    pub sensor_type: SensorKind,
    pub value: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAnomaly {
    pub plot: i32,
    pub anomaly_type: AnomalyKind,
    pub severity: Severity,
    pub model_confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub anomaly_event: i32,
    pub recommended_action: String,
    pub explanation_text: String,
    pub confidence: String,
}

/// Persistence port.
///
/// Records are returned with their ownership chain resolved. Deleting a
/// parent deletes all its descendants. A second farm for the same owner is
/// rejected with `DBError::Duplicate`, a missing parent with
/// `DBError::MissingParent`.
///
/// `insert_anomaly` and `insert_recommendation` are the ingestion points of
/// the detection model and the recommendation agent; they are not reachable
/// over REST.
#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn check(&self) -> Result<(), DBError>;

    async fn count_farms(&self) -> Result<i64, DBError>;

    async fn farms(&self, scope: Scope, filter: &FarmFilter) -> Result<Vec<FarmProfile>, DBError>;
    async fn farm(&self, id: i32) -> Result<Option<FarmProfile>, DBError>;
    async fn farm_of_owner(&self, owner: UserId) -> Result<Option<FarmProfile>, DBError>;
    async fn insert_farm(&self, farm: NewFarm) -> Result<FarmProfile, DBError>;
    async fn update_farm(&self, id: i32, update: FarmUpdate)
        -> Result<Option<FarmProfile>, DBError>;
    async fn delete_farm(&self, id: i32) -> Result<bool, DBError>;

    async fn plots(&self, scope: Scope, filter: &PlotFilter) -> Result<Vec<FieldPlot>, DBError>;
    async fn plot(&self, id: i32) -> Result<Option<FieldPlot>, DBError>;
    async fn insert_plot(&self, plot: NewPlot) -> Result<FieldPlot, DBError>;
    async fn update_plot(&self, id: i32, update: PlotUpdate) -> Result<Option<FieldPlot>, DBError>;
    async fn delete_plot(&self, id: i32) -> Result<bool, DBError>;

    async fn readings(
        &self,
        scope: Scope,
        filter: &ReadingFilter,
    ) -> Result<Vec<SensorReading>, DBError>;
    async fn reading(&self, id: i32) -> Result<Option<SensorReading>, DBError>;
    async fn insert_reading(&self, reading: NewReading) -> Result<SensorReading, DBError>;
    async fn update_reading(
        &self,
        id: i32,
        update: ReadingUpdate,
    ) -> Result<Option<SensorReading>, DBError>;
    async fn delete_reading(&self, id: i32) -> Result<bool, DBError>;

    async fn anomalies(
        &self,
        scope: Scope,
        filter: &AnomalyFilter,
    ) -> Result<Vec<AnomalyEvent>, DBError>;
    async fn anomaly(&self, id: i32) -> Result<Option<AnomalyEvent>, DBError>;
    async fn insert_anomaly(&self, anomaly: NewAnomaly) -> Result<AnomalyEvent, DBError>;

    async fn recommendations(
        &self,
        scope: Scope,
        filter: &RecommendationFilter,
    ) -> Result<Vec<AgentRecommendation>, DBError>;
    async fn recommendation(&self, id: i32) -> Result<Option<AgentRecommendation>, DBError>;
    async fn insert_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<AgentRecommendation, DBError>;
}

pub mod anomaly;
pub mod farm;
pub mod memory;
pub mod plot;
pub mod reading;
pub mod recommendation;

mod pg_store;

pub use memory::MemoryStore;
pub use pg_store::PgStore;
