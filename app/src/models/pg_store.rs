use super::*;
use std::convert::TryFrom;

/// Postgres backed store, every call is a single statement on the pool
pub struct PgStore {
    conn: sqlx::PgPool,
}

impl PgStore {
    pub fn new(conn: sqlx::PgPool) -> Self {
        PgStore { conn }
    }
}

fn convert_all<D, T>(daos: Vec<D>) -> Result<Vec<T>, DBError>
where
    T: TryFrom<D, Error = farmwatch_core::error::ModelError>,
{
    Ok(daos
        .into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<T>, _>>()?)
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), DBError> {
        check_schema(&self.conn).await
    }

    async fn count_farms(&self) -> Result<i64, DBError> {
        farm::count(&self.conn).await
    }

    async fn farms(&self, scope: Scope, filter: &FarmFilter) -> Result<Vec<FarmProfile>, DBError> {
        let daos = farm::read(&self.conn, scope, filter).await?;
        Ok(daos.into_iter().map(FarmProfile::from).collect())
    }

    async fn farm(&self, id: i32) -> Result<Option<FarmProfile>, DBError> {
        Ok(farm::get(&self.conn, id).await?.map(FarmProfile::from))
    }

    async fn farm_of_owner(&self, owner: UserId) -> Result<Option<FarmProfile>, DBError> {
        Ok(farm::get_by_owner(&self.conn, owner)
            .await?
            .map(FarmProfile::from))
    }

    async fn insert_farm(&self, new_farm: NewFarm) -> Result<FarmProfile, DBError> {
        Ok(farm::insert(&self.conn, &new_farm).await?.into())
    }

    async fn update_farm(
        &self,
        id: i32,
        update: FarmUpdate,
    ) -> Result<Option<FarmProfile>, DBError> {
        Ok(farm::update(&self.conn, id, &update)
            .await?
            .map(FarmProfile::from))
    }

    async fn delete_farm(&self, id: i32) -> Result<bool, DBError> {
        farm::delete(&self.conn, id).await
    }

    async fn plots(&self, scope: Scope, filter: &PlotFilter) -> Result<Vec<FieldPlot>, DBError> {
        let daos = plot::read(&self.conn, scope, filter).await?;
        Ok(daos.into_iter().map(FieldPlot::from).collect())
    }

    async fn plot(&self, id: i32) -> Result<Option<FieldPlot>, DBError> {
        Ok(plot::get(&self.conn, id).await?.map(FieldPlot::from))
    }

    async fn insert_plot(&self, new_plot: NewPlot) -> Result<FieldPlot, DBError> {
        Ok(plot::insert(&self.conn, &new_plot).await?.into())
    }

    async fn update_plot(&self, id: i32, update: PlotUpdate) -> Result<Option<FieldPlot>, DBError> {
        Ok(plot::update(&self.conn, id, &update)
            .await?
            .map(FieldPlot::from))
    }

    async fn delete_plot(&self, id: i32) -> Result<bool, DBError> {
        plot::delete(&self.conn, id).await
    }

    async fn readings(
        &self,
        scope: Scope,
        filter: &ReadingFilter,
    ) -> Result<Vec<SensorReading>, DBError> {
        convert_all(reading::read(&self.conn, scope, filter).await?)
    }

    async fn reading(&self, id: i32) -> Result<Option<SensorReading>, DBError> {
        match reading::get(&self.conn, id).await? {
            Some(dao) => Ok(Some(SensorReading::try_from(dao)?)),
            None => Ok(None),
        }
    }

    async fn insert_reading(&self, new_reading: NewReading) -> Result<SensorReading, DBError> {
        let dao = reading::insert(&self.conn, &new_reading).await?;
        Ok(SensorReading::try_from(dao)?)
    }

    async fn update_reading(
        &self,
        id: i32,
        update: ReadingUpdate,
    ) -> Result<Option<SensorReading>, DBError> {
        match reading::update(&self.conn, id, &update).await? {
            Some(dao) => Ok(Some(SensorReading::try_from(dao)?)),
            None => Ok(None),
        }
    }

    async fn delete_reading(&self, id: i32) -> Result<bool, DBError> {
        reading::delete(&self.conn, id).await
    }

    async fn anomalies(
        &self,
        scope: Scope,
        filter: &AnomalyFilter,
    ) -> Result<Vec<AnomalyEvent>, DBError> {
        convert_all(anomaly::read(&self.conn, scope, filter).await?)
    }

    async fn anomaly(&self, id: i32) -> Result<Option<AnomalyEvent>, DBError> {
        match anomaly::get(&self.conn, id).await? {
            Some(dao) => Ok(Some(AnomalyEvent::try_from(dao)?)),
            None => Ok(None),
        }
    }

    async fn insert_anomaly(&self, new_anomaly: NewAnomaly) -> Result<AnomalyEvent, DBError> {
        let dao = anomaly::insert(&self.conn, &new_anomaly).await?;
        Ok(AnomalyEvent::try_from(dao)?)
    }

    async fn recommendations(
        &self,
        scope: Scope,
        filter: &RecommendationFilter,
    ) -> Result<Vec<AgentRecommendation>, DBError> {
        let daos = recommendation::read(&self.conn, scope, filter).await?;
        Ok(daos.into_iter().map(AgentRecommendation::from).collect())
    }

    async fn recommendation(&self, id: i32) -> Result<Option<AgentRecommendation>, DBError> {
        Ok(recommendation::get(&self.conn, id)
            .await?
            .map(AgentRecommendation::from))
    }

    async fn insert_recommendation(
        &self,
        new_recommendation: NewRecommendation,
    ) -> Result<AgentRecommendation, DBError> {
        Ok(recommendation::insert(&self.conn, &new_recommendation)
            .await?
            .into())
    }
}
