use super::assign;
use super::authorize;
use super::payload::{ReadingPatch, ReadingPayload, Validate};
use crate::error::{ApiError, ServiceError};
use crate::models::{NewReading, ReadingUpdate, Store};
use farmwatch_core::{scope, Principal, ReadingFilter, Scoped, SensorReading};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ReadingHandler {
    store: Arc<dyn Store>,
}

impl ReadingHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ReadingHandler { store }
    }

    /// Most recent readings first
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: ReadingFilter,
    ) -> Result<Vec<SensorReading>, ServiceError> {
        let readings = self.store.readings(scope(principal), &filter).await?;
        debug!(count = readings.len(), "Listed readings");
        Ok(readings)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<SensorReading, ServiceError> {
        Ok(authorize(principal, id, self.store.reading(id).await?)?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        principal: &Principal,
        payload: ReadingPayload,
    ) -> Result<SensorReading, ServiceError> {
        let fields = payload.to_update();
        fields.validate()?;
        let plot = assign::reading_plot(self.store.as_ref(), principal, payload.plot).await?;

        let reading = self
            .store
            .insert_reading(NewReading {
                plot: plot.id,
                sensor_type: fields.sensor_type,
                value: fields.value,
                source: fields.source,
            })
            .await?;
        info!(
            reading_id = reading.id,
            plot_id = reading.plot,
            sensor_type = %reading.sensor_type,
            "Stored reading"
        );
        Ok(reading)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: i32,
        payload: ReadingPayload,
    ) -> Result<SensorReading, ServiceError> {
        let reading = self.retrieve(principal, id).await?;
        let update = payload.replace(&reading);
        update.validate()?;
        self.store_update(id, update).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn partial_update(
        &self,
        principal: &Principal,
        id: i32,
        patch: ReadingPatch,
    ) -> Result<SensorReading, ServiceError> {
        let reading = self.retrieve(principal, id).await?;
        let update = patch.apply(&reading);
        update.validate()?;
        self.store_update(id, update).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, principal: &Principal, id: i32) -> Result<(), ServiceError> {
        self.retrieve(principal, id).await?;
        if !self.store.delete_reading(id).await? {
            return Err(ApiError::NotFound(SensorReading::RESOURCE, id).into());
        }
        info!(reading_id = id, "Deleted reading");
        Ok(())
    }

    async fn store_update(
        &self,
        id: i32,
        update: ReadingUpdate,
    ) -> Result<SensorReading, ServiceError> {
        let reading = self
            .store
            .update_reading(id, update)
            .await?
            .ok_or(ApiError::NotFound(SensorReading::RESOURCE, id))?;
        info!(reading_id = id, "Updated reading");
        Ok(reading)
    }
}
