use super::NewRecommendation;
use crate::error::DBError;
use chrono::{DateTime, Utc};
use farmwatch_core::{AgentRecommendation, RecommendationFilter, Scope};

#[derive(sqlx::FromRow, Debug)]
pub struct RecommendationDao {
    pub(crate) id: i32,
    pub(crate) anomaly_event_id: i32,
    pub(crate) recommended_action: String,
    pub(crate) explanation_text: String,
    pub(crate) confidence: String,
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) farm_id: i32,
    pub(crate) owner_id: i32,
}

impl From<RecommendationDao> for AgentRecommendation {
    fn from(val: RecommendationDao) -> Self {
        AgentRecommendation {
            id: val.id,
            anomaly_event: val.anomaly_event_id,
            recommended_action: val.recommended_action,
            explanation_text: val.explanation_text,
            confidence: val.confidence,
            generated_at: val.generated_at,
            farm: val.farm_id,
            owner: val.owner_id,
        }
    }
}

/// Written by the recommendation agent, never over REST
pub async fn insert(
    conn: &sqlx::PgPool,
    recommendation: &NewRecommendation,
) -> Result<RecommendationDao, DBError> {
    sql_stmnt!(
        RecommendationDao,
        r#"WITH ar AS (
                INSERT INTO agent_recommendations
                    (anomaly_event_id, recommended_action, explanation_text, confidence)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT ar.id, ar.anomaly_event_id, ar.recommended_action, ar.explanation_text,
                ar.confidence, ar.generated_at, p.farm_id, f.owner_id
            FROM ar
            JOIN anomaly_events AS a ON (ar.anomaly_event_id = a.id)
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)"#,
        recommendation.anomaly_event,
        &recommendation.recommended_action,
        &recommendation.explanation_text,
        &recommendation.confidence
    )
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            DBError::MissingParent(format!(
                "anomaly {} does not exist",
                recommendation.anomaly_event
            ))
        }
        other => DBError::SQLError(other),
    })
}

/// READ agent_recommendations
pub async fn read(
    conn: &sqlx::PgPool,
    scope: Scope,
    filter: &RecommendationFilter,
) -> Result<Vec<RecommendationDao>, DBError> {
    Ok(sql_stmnt!(
        RecommendationDao,
        r#"SELECT ar.id, ar.anomaly_event_id, ar.recommended_action, ar.explanation_text,
                ar.confidence, ar.generated_at, p.farm_id, f.owner_id
            FROM agent_recommendations AS ar
            JOIN anomaly_events AS a ON (ar.anomaly_event_id = a.id)
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE ($1::int IS NULL OR f.owner_id = $1)
            AND ($2::int IS NULL OR ar.anomaly_event_id = $2)
            AND ($3::text IS NULL OR ar.confidence = $3)
            ORDER BY ar.id ASC"#,
        scope.owner(),
        filter.anomaly_event,
        filter.confidence.as_deref()
    )
    .fetch_all(conn)
    .await?)
}

pub async fn get(
    conn: &sqlx::PgPool,
    recommendation_id: i32,
) -> Result<Option<RecommendationDao>, DBError> {
    Ok(sql_stmnt!(
        RecommendationDao,
        r#"SELECT ar.id, ar.anomaly_event_id, ar.recommended_action, ar.explanation_text,
                ar.confidence, ar.generated_at, p.farm_id, f.owner_id
            FROM agent_recommendations AS ar
            JOIN anomaly_events AS a ON (ar.anomaly_event_id = a.id)
            JOIN field_plots AS p ON (a.plot_id = p.id)
            JOIN farm_profiles AS f ON (p.farm_id = f.id)
            WHERE ar.id = $1"#,
        recommendation_id
    )
    .fetch_optional(conn)
    .await?)
}
