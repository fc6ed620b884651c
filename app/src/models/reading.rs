use super::{NewReading, ReadingUpdate};
use crate::error::DBError;
use chrono::{DateTime, Utc};
use farmwatch_core::{error::ModelError, ReadingFilter, Scope, SensorReading};
use std::convert::TryFrom;

/// A sensor_readings row joined up to the owning farm
#[derive(sqlx::FromRow, Debug)]
pub struct ReadingDao {
    pub(crate) id: i32,
    pub(crate) plot_id: i32,
    pub(crate) sensor_type: String,
    pub(crate) value: f64,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) source: String,
    pub(crate) farm_id: i32,
    pub(crate) owner_id: i32,
}

impl TryFrom<ReadingDao> for SensorReading {
    type Error = ModelError;

    fn try_from(val: ReadingDao) -> Result<Self, Self::Error> {
        Ok(SensorReading {
            id: val.id,
            plot: val.plot_id,
            sensor_type: val.sensor_type.parse()?,
            value: val.value,
            timestamp: val.timestamp,
            source: val.source,
            farm: val.farm_id,
            owner: val.owner_id,
        })
    }
}

pub async fn insert(conn: &sqlx::PgPool, reading: &NewReading) -> Result<ReadingDao, DBError> {
    sql_stmnt!(
        ReadingDao,
        r#"WITH r AS (
                INSERT INTO sensor_readings (plot_id, sensor_type, value, source)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT r.id, r.plot_id, r.sensor_type, r.value, r.timestamp, r.source, p.farm_id, f.owner_id
            FROM r
            JOIN field_plots AS p ON (r.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        reading.plot,
        reading.sensor_type.as_str(),
        reading.value,
        &reading.source
    )
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            DBError::MissingParent(format!("plot {} does not exist", reading.plot))
        }
        other => DBError::SQLError(other),
    })
}

/// READ sensor_readings, most recent first
pub async fn read(
    conn: &sqlx::PgPool,
    scope: Scope,
    filter: &ReadingFilter,
) -> Result<Vec<ReadingDao>, DBError> {
    Ok(sql_stmnt!(
        ReadingDao,
        r#"SELECT r.id, r.plot_id, r.sensor_type, r.value, r.timestamp, r.source, p.farm_id, f.owner_id
            FROM sensor_readings AS r
            JOIN field_plots AS p ON (r.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE ($1::int IS NULL OR f.owner_id = $1)
            AND ($2::int IS NULL OR r.plot_id = $2)
            AND ($3::text IS NULL OR r.sensor_type = $3)
            ORDER BY r.timestamp DESC, r.id DESC"#,
        scope.owner(),
        filter.plot,
        filter.sensor_type.map(|kind| kind.as_str())
    )
    .fetch_all(conn)
    .await?)
}

pub async fn get(conn: &sqlx::PgPool, reading_id: i32) -> Result<Option<ReadingDao>, DBError> {
    Ok(sql_stmnt!(
        ReadingDao,
        r#"SELECT r.id, r.plot_id, r.sensor_type, r.value, r.timestamp, r.source, p.farm_id, f.owner_id
            FROM sensor_readings AS r
            JOIN field_plots AS p ON (r.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE r.id = $1"#,
        reading_id
    )
    .fetch_optional(conn)
    .await?)
}

// UPDATE sensor_readings, neither plot nor timestamp are touched
pub async fn update(
    conn: &sqlx::PgPool,
    reading_id: i32,
    update: &ReadingUpdate,
) -> Result<Option<ReadingDao>, DBError> {
    Ok(sql_stmnt!(
        ReadingDao,
        r#"WITH r AS (
                UPDATE sensor_readings
                SET sensor_type = $2, value = $3, source = $4
                WHERE id = $1
                RETURNING *
            )
            SELECT r.id, r.plot_id, r.sensor_type, r.value, r.timestamp, r.source, p.farm_id, f.owner_id
            FROM r
            JOIN field_plots AS p ON (r.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        reading_id,
        update.sensor_type.as_str(),
        update.value,
        &update.source
    )
    .fetch_optional(conn)
    .await?)
}

pub async fn delete(conn: &sqlx::PgPool, reading_id: i32) -> Result<bool, DBError> {
    let result = sql_stmnt!("DELETE FROM sensor_readings WHERE id = $1", reading_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
