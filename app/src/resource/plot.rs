use super::assign;
use super::authorize;
use super::payload::{PlotPatch, PlotPayload, Validate};
use crate::error::{ApiError, ServiceError};
use crate::models::{NewPlot, PlotUpdate, Store};
use farmwatch_core::{scope, FieldPlot, PlotFilter, Principal, Scoped};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PlotHandler {
    store: Arc<dyn Store>,
}

impl PlotHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        PlotHandler { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        principal: &Principal,
        filter: PlotFilter,
    ) -> Result<Vec<FieldPlot>, ServiceError> {
        let plots = self.store.plots(scope(principal), &filter).await?;
        debug!(count = plots.len(), "Listed plots");
        Ok(plots)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve(&self, principal: &Principal, id: i32) -> Result<FieldPlot, ServiceError> {
        Ok(authorize(principal, id, self.store.plot(id).await?)?)
    }

    /// The plot is attached to the caller's farm, administrators name it
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        principal: &Principal,
        payload: PlotPayload,
    ) -> Result<FieldPlot, ServiceError> {
        let fields = payload.to_update();
        fields.validate()?;
        let farm = assign::plot_farm(self.store.as_ref(), principal, payload.farm).await?;

        let plot = self
            .store
            .insert_plot(NewPlot {
                farm,
                name: fields.name,
                crop_variety: fields.crop_variety,
                size: fields.size,
                location_coordinates: fields.location_coordinates,
            })
            .await?;
        info!(plot_id = plot.id, farm_id = plot.farm, "Created plot");
        Ok(plot)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: i32,
        payload: PlotPayload,
    ) -> Result<FieldPlot, ServiceError> {
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
        patch: PlotPatch,
    ) -> Result<FieldPlot, ServiceError> {
        let plot = self.retrieve(principal, id).await?;
        let update = patch.apply(&plot);
        update.validate()?;
        self.store_update(id, update).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, principal: &Principal, id: i32) -> Result<(), ServiceError> {
        self.retrieve(principal, id).await?;
        if !self.store.delete_plot(id).await? {
            return Err(ApiError::NotFound(FieldPlot::RESOURCE, id).into());
        }
        info!(plot_id = id, "Deleted plot");
        Ok(())
    }

    async fn store_update(&self, id: i32, update: PlotUpdate) -> Result<FieldPlot, ServiceError> {
        let plot = self
            .store
            .update_plot(id, update)
            .await?
            .ok_or(ApiError::NotFound(FieldPlot::RESOURCE, id))?;
        info!(plot_id = id, "Updated plot");
        Ok(plot)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{MemoryStore, NewFarm};

    fn payload(name: &str, farm: Option<i32>) -> PlotPayload {
        PlotPayload {
            farm,
            name: name.to_owned(),
            crop_variety: "durum".to_owned(),
            size: 2.5,
            location_coordinates: None,
        }
    }

    async fn build_handler(owners: &[i32]) -> (PlotHandler, Vec<i32>) {
        let store = Arc::new(MemoryStore::new());
        let mut farms = Vec::new();
        for owner in owners {
            let farm = store
                .insert_farm(NewFarm {
                    owner: *owner,
                    name: format!("Farm of {}", owner),
                    location: "Valley".to_owned(),
                    size: 10.0,
                    crop_type: "wheat".to_owned(),
                })
                .await
                .unwrap();
            farms.push(farm.id);
        }
        (PlotHandler::new(store), farms)
    }

    #[tokio::test]
    async fn test_plot_is_attached_to_own_farm() {
        // Prepare
        let (handler, farms) = build_handler(&[1, 2]).await;

        // Execute
        let plot = handler
            .create(&Principal::user(1), payload("North Field", Some(farms[1])))
            .await
            .unwrap();

        // Validate
        assert_eq!(farms[0], plot.farm);
        assert_eq!(1, plot.owner);
    }

    #[tokio::test]
    async fn test_plot_without_farm_is_not_persisted() {
        // Prepare
        let (handler, _) = build_handler(&[1]).await;

        // Execute
        let res = handler
            .create(&Principal::user(3), payload("North Field", None))
            .await;

        // Validate
        assert!(matches!(res, Err(ServiceError::User(ApiError::Validation(_)))));
        assert!(handler
            .list(&Principal::admin(9), PlotFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_admin_names_farm() {
        let (handler, farms) = build_handler(&[1, 2]).await;

        let plot = handler
            .create(&Principal::admin(9), payload("South", Some(farms[1])))
            .await
            .unwrap();

        assert_eq!(farms[1], plot.farm);
        assert_eq!(2, plot.owner);
    }

    #[tokio::test]
    async fn test_filter_narrows_scope() {
        // Prepare
        let (handler, farms) = build_handler(&[1, 2]).await;
        handler
            .create(&Principal::user(1), payload("North", None))
            .await
            .unwrap();
        handler
            .create(&Principal::user(2), payload("South", None))
            .await
            .unwrap();

        // Execute
        let foreign = handler
            .list(
                &Principal::user(1),
                PlotFilter {
                    farm: Some(farms[1]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let own = handler
            .list(
                &Principal::user(1),
                PlotFilter {
                    search: Some("NOR".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Validate
        assert!(foreign.is_empty());
        assert_eq!(1, own.len());
    }

    #[tokio::test]
    async fn test_update_never_moves_plot() {
        let (handler, farms) = build_handler(&[1, 2]).await;
        let principal = Principal::user(1);
        let plot = handler
            .create(&principal, payload("North", None))
            .await
            .unwrap();

        let updated = handler
            .update(&principal, plot.id, payload("Renamed", Some(farms[1])))
            .await
            .unwrap();

        assert_eq!("Renamed", updated.name);
        assert_eq!(farms[0], updated.farm);
        assert!(matches!(
            handler.delete(&Principal::user(2), plot.id).await,
            Err(ServiceError::User(ApiError::Forbidden(..)))
        ));
        handler.delete(&principal, plot.id).await.unwrap();
        assert!(matches!(
            handler.retrieve(&principal, plot.id).await,
            Err(ServiceError::User(ApiError::NotFound(..)))
        ));
    }
}
