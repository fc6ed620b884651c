use super::assign;
use super::authorize;
use super::payload::{FarmPatch, FarmPayload, Validate};
use crate::error::{ApiError, ServiceError};
use crate::models::{FarmUpdate, NewFarm, Store};
use farmwatch_core::{scope, FarmFilter, FarmProfile, Principal, Scoped};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FarmHandler {
    store: Arc<dyn Store>,
}

impl FarmHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        FarmHandler { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: FarmFilter,
    ) -> Result<Vec<FarmProfile>, ServiceError> {
        let farms = self.store.farms(scope(principal), &filter).await?;
        debug!(count = farms.len(), "Listed farms");
        Ok(farms)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve(&self, principal: &Principal, id: i32) -> Result<FarmProfile, ServiceError> {
        Ok(authorize(principal, id, self.store.farm(id).await?)?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        principal: &Principal,
        payload: FarmPayload,
    ) -> Result<FarmProfile, ServiceError> {
        let fields = payload.to_update();
        fields.validate()?;
        let owner = assign::farm_owner(self.store.as_ref(), principal, payload.owner).await?;

        let farm = self
            .store
            .insert_farm(NewFarm {
                owner,
                name: fields.name,
                location: fields.location,
                size: fields.size,
                crop_type: fields.crop_type,
            })
            .await?;
        info!(farm_id = farm.id, owner = farm.owner, "Created farm");
        Ok(farm)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: i32,
        payload: FarmPayload,
    ) -> Result<FarmProfile, ServiceError> {
        self.retrieve(principal, id).await?;
        let update = payload.to_update();
        update.validate()?;
        self.store_update(id, update).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn partial_update(
        &self,
        principal: &Principal,
        id: i32,
        patch: FarmPatch,
    ) -> Result<FarmProfile, ServiceError> {
        let farm = self.retrieve(principal, id).await?;
        let update = patch.apply(&farm);
        update.validate()?;
        self.store_update(id, update).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, principal: &Principal, id: i32) -> Result<(), ServiceError> {
        self.retrieve(principal, id).await?;
        if !self.store.delete_farm(id).await? {
            return Err(ApiError::NotFound(FarmProfile::RESOURCE, id).into());
        }
        info!(farm_id = id, "Deleted farm");
        Ok(())
    }

    async fn store_update(
        &self,
        id: i32,
        update: FarmUpdate,
    ) -> Result<FarmProfile, ServiceError> {
        let farm = self
            .store
            .update_farm(id, update)
            .await?
            .ok_or(ApiError::NotFound(FarmProfile::RESOURCE, id))?;
        info!(farm_id = id, "Updated farm");
        Ok(farm)
    }
}
