use super::{like_pattern, NewPlot, PlotUpdate};
use crate::error::DBError;
use farmwatch_core::{FieldPlot, PlotFilter, Scope};

/// A field_plots row joined with the owner of its farm
#[derive(sqlx::FromRow, Debug)]
pub struct PlotDao {
    pub(crate) id: i32,
    pub(crate) farm_id: i32,
    pub(crate) name: String,
    pub(crate) crop_variety: String,
    pub(crate) size: f64,
    pub(crate) location_coordinates: Option<String>,
    pub(crate) owner_id: i32,
}

impl From<PlotDao> for FieldPlot {
    fn from(val: PlotDao) -> Self {
        FieldPlot {
            id: val.id,
            farm: val.farm_id,
            name: val.name,
            crop_variety: val.crop_variety,
            size: val.size,
            location_coordinates: val.location_coordinates,
            owner: val.owner_id,
        }
    }
}

pub async fn insert(conn: &sqlx::PgPool, plot: &NewPlot) -> Result<PlotDao, DBError> {
    sql_stmnt!(
        PlotDao,
        r#"WITH p AS (
                INSERT INTO field_plots (farm_id, name, crop_variety, size, location_coordinates)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT p.id, p.farm_id, p.name, p.crop_variety, p.size, p.location_coordinates, f.owner_id
            FROM p JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        plot.farm,
        &plot.name,
        &plot.crop_variety,
        plot.size,
        plot.location_coordinates.as_deref()
    )
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            DBError::MissingParent(format!("farm {} does not exist", plot.farm))
        }
        other => DBError::SQLError(other),
    })
}

/// READ field_plots
pub async fn read(
    conn: &sqlx::PgPool,
    scope: Scope,
    filter: &PlotFilter,
) -> Result<Vec<PlotDao>, DBError> {
    Ok(sql_stmnt!(
        PlotDao,
        r#"SELECT p.id, p.farm_id, p.name, p.crop_variety, p.size, p.location_coordinates, f.owner_id
            FROM field_plots AS p
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE ($1::int IS NULL OR f.owner_id = $1)
            AND ($2::int IS NULL OR p.farm_id = $2)
            AND ($3::text IS NULL OR p.crop_variety = $3)
            AND ($4::text IS NULL OR p.name ILIKE $4 OR p.crop_variety ILIKE $4)
            ORDER BY p.id ASC"#,
        scope.owner(),
        filter.farm,
        filter.crop_variety.as_deref(),
        like_pattern(&filter.search)
    )
    .fetch_all(conn)
    .await?)
}

pub async fn get(conn: &sqlx::PgPool, plot_id: i32) -> Result<Option<PlotDao>, DBError> {
    Ok(sql_stmnt!(
        PlotDao,
        r#"SELECT p.id, p.farm_id, p.name, p.crop_variety, p.size, p.location_coordinates, f.owner_id
            FROM field_plots AS p
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE p.id = $1"#,
        plot_id
    )
    .fetch_optional(conn)
    .await?)
}

// UPDATE field_plots, the farm is never touched
pub async fn update(
    conn: &sqlx::PgPool,
    plot_id: i32,
    update: &PlotUpdate,
) -> Result<Option<PlotDao>, DBError> {
    Ok(sql_stmnt!(
        PlotDao,
        r#"WITH p AS (
                UPDATE field_plots
                SET name = $2, crop_variety = $3, size = $4, location_coordinates = $5
                WHERE id = $1
                RETURNING *
            )
            SELECT p.id, p.farm_id, p.name, p.crop_variety, p.size, p.location_coordinates, f.owner_id
            FROM p JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        plot_id,
        &update.name,
        &update.crop_variety,
        update.size,
        update.location_coordinates.as_deref()
    )
    .fetch_optional(conn)
    .await?)
}

pub async fn delete(conn: &sqlx::PgPool, plot_id: i32) -> Result<bool, DBError> {
    let result = sql_stmnt!("DELETE FROM field_plots WHERE id = $1", plot_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
