use super::NewAnomaly;
use crate::error::DBError;
use chrono::{DateTime, Utc};
use farmwatch_core::{error::ModelError, AnomalyEvent, AnomalyFilter, Scope};
use std::convert::TryFrom;

#[derive(sqlx::FromRow, Debug)]
pub struct AnomalyDao {
    pub(crate) id: i32,
    pub(crate) plot_id: i32,
    pub(crate) anomaly_type: String,
    pub(crate) severity: String,
    pub(crate) model_confidence: f64,
    pub(crate) detected_at: DateTime<Utc>,
    pub(crate) farm_id: i32,
    pub(crate) owner_id: i32,
}

impl TryFrom<AnomalyDao> for AnomalyEvent {
    type Error = ModelError;

    fn try_from(val: AnomalyDao) -> Result<Self, Self::Error> {
        Ok(AnomalyEvent {
            id: val.id,
            plot: val.plot_id,
            anomaly_type: val.anomaly_type.parse()?,
            severity: val.severity.parse()?,
            model_confidence: val.model_confidence,
            detected_at: val.detected_at,
            farm: val.farm_id,
            owner: val.owner_id,
        })
    }
}

/// Written by the detection model, never over REST
pub async fn insert(conn: &sqlx::PgPool, anomaly: &NewAnomaly) -> Result<AnomalyDao, DBError> {
    sql_stmnt!(
        AnomalyDao,
        r#"WITH a AS (
                INSERT INTO anomaly_events (plot_id, anomaly_type, severity, model_confidence)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT a.id, a.plot_id, a.anomaly_type, a.severity, a.model_confidence, a.detected_at, p.farm_id, f.owner_id
            FROM a
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        anomaly.plot,
        anomaly.anomaly_type.as_str(),
        anomaly.severity.as_str(),
        anomaly.model_confidence
    )
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            DBError::MissingParent(format!("plot {} does not exist", anomaly.plot))
        }
        other => DBError::SQLError(other),
    })
}

/// READ anomaly_events
pub async fn read(
    conn: &sqlx::PgPool,
    scope: Scope,
    filter: &AnomalyFilter,
) -> Result<Vec<AnomalyDao>, DBError> {
    Ok(sql_stmnt!(
        AnomalyDao,
        r#"SELECT a.id, a.plot_id, a.anomaly_type, a.severity, a.model_confidence, a.detected_at, p.farm_id, f.owner_id
            FROM anomaly_events AS a
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE ($1::int IS NULL OR f.owner_id = $1)
            AND ($2::int IS NULL OR a.plot_id = $2)
            AND ($3::text IS NULL OR a.anomaly_type = $3)
            AND ($4::text IS NULL OR a.severity = $4)
            ORDER BY a.id ASC"#,
        scope.owner(),
        filter.plot,
        filter.anomaly_type.map(|kind| kind.as_str()),
        filter.severity.map(|severity| severity.as_str())
    )
    .fetch_all(conn)
    .await?)
}

pub async fn get(conn: &sqlx::PgPool, anomaly_id: i32) -> Result<Option<AnomalyDao>, DBError> {
    Ok(sql_stmnt!(
        AnomalyDao,
        r#"SELECT a.id, a.plot_id, a.anomaly_type, a.severity, a.model_confidence, a.detected_at, p.farm_id, f.owner_id
            FROM anomaly_events AS a
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE a.id = $1"#,
        anomaly_id
    )
    .fetch_optional(conn)
    .await?)
}
