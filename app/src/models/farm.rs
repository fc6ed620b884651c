use super::{like_pattern, CountRecord, FarmUpdate, NewFarm};
use crate::error::DBError;
use chrono::{DateTime, Utc};
use farmwatch_core::{FarmFilter, FarmProfile, Scope, UserId};

#[derive(sqlx::FromRow, Debug)]
pub struct FarmDao {
    pub(crate) id: i32,
    pub(crate) owner_id: i32,
    pub(crate) name: String,
    pub(crate) location: String,
    pub(crate) size: f64,
    pub(crate) crop_type: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<FarmDao> for FarmProfile {
    fn from(val: FarmDao) -> Self {
        FarmProfile {
            id: val.id,
            owner: val.owner_id,
            name: val.name,
            location: val.location,
            size: val.size,
            crop_type: val.crop_type,
            created_at: val.created_at,
        }
    }
}

pub async fn insert(conn: &sqlx::PgPool, farm: &NewFarm) -> Result<FarmDao, DBError> {
    sql_stmnt!(
        FarmDao,
        r#"INSERT INTO farm_profiles (owner_id, name, location, size, crop_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, location, size, crop_type, created_at"#,
        farm.owner,
        &farm.name,
        &farm.location,
        farm.size,
        &farm.crop_type
    )
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            DBError::Duplicate(format!("User {} already owns a farm.", farm.owner))
        }
        other => DBError::SQLError(other),
    })
}

/// READ farm_profiles
pub async fn read(
    conn: &sqlx::PgPool,
    scope: Scope,
    filter: &FarmFilter,
) -> Result<Vec<FarmDao>, DBError> {
    Ok(sql_stmnt!(
        FarmDao,
        r#"SELECT id, owner_id, name, location, size, crop_type, created_at
            FROM farm_profiles
            WHERE ($1::int IS NULL OR owner_id = $1)
            AND ($2::text IS NULL OR crop_type = $2)
            AND ($3::text IS NULL OR name ILIKE $3 OR location ILIKE $3)
            ORDER BY id ASC"#,
        scope.owner(),
        filter.crop_type.as_deref(),
        like_pattern(&filter.search)
    )
    .fetch_all(conn)
    .await?)
}

pub async fn get(conn: &sqlx::PgPool, farm_id: i32) -> Result<Option<FarmDao>, DBError> {
    Ok(sql_stmnt!(
        FarmDao,
        r#"SELECT id, owner_id, name, location, size, crop_type, created_at
            FROM farm_profiles WHERE id = $1"#,
        farm_id
    )
    .fetch_optional(conn)
    .await?)
}

pub async fn get_by_owner(
    conn: &sqlx::PgPool,
    owner: UserId,
) -> Result<Option<FarmDao>, DBError> {
    Ok(sql_stmnt!(
        FarmDao,
        r#"SELECT id, owner_id, name, location, size, crop_type, created_at
            FROM farm_profiles WHERE owner_id = $1
            ORDER BY id ASC LIMIT 1"#,
        owner
    )
    .fetch_optional(conn)
    .await?)
}

pub async fn count(conn: &sqlx::PgPool) -> Result<i64, DBError> {
    let rows = sql_stmnt!(CountRecord, "SELECT count(*) as count FROM farm_profiles")
        .fetch_one(conn)
        .await?;
    Ok(rows.count())
}

// UPDATE farm_profiles, the owner is never touched
pub async fn update(
    conn: &sqlx::PgPool,
    farm_id: i32,
    update: &FarmUpdate,
) -> Result<Option<FarmDao>, DBError> {
    Ok(sql_stmnt!(
        FarmDao,
        r#"UPDATE farm_profiles
            SET name = $2, location = $3, size = $4, crop_type = $5
            WHERE id = $1
            RETURNING id, owner_id, name, location, size, crop_type, created_at"#,
        farm_id,
        &update.name,
        &update.location,
        update.size,
        &update.crop_type
    )
    .fetch_optional(conn)
    .await?)
}

/// DELETE farm_profiles, plots and everything below cascade
pub async fn delete(conn: &sqlx::PgPool, farm_id: i32) -> Result<bool, DBError> {
    let result = sql_stmnt!("DELETE FROM farm_profiles WHERE id = $1", farm_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
