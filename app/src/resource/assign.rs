//! Binds new records to their parent without trusting client supplied
//! ownership data

use crate::error::{ApiError, ServiceError};
use crate::models::Store;
use farmwatch_core::{can_access, FieldPlot, Principal, Scoped, UserId};
use tracing::debug;

/// Owner of a new farm. Users always own what they create, administrators
/// may create on behalf of someone else.
pub async fn farm_owner(
    store: &dyn Store,
    principal: &Principal,
    requested: Option<UserId>,
) -> Result<UserId, ServiceError> {
    let owner = if principal.is_admin() {
        requested.unwrap_or_else(|| principal.user_id())
    } else {
        if let Some(ignored) = requested.filter(|owner| *owner != principal.user_id()) {
            debug!(requested_owner = ignored, "Ignoring owner of non admin");
        }
        principal.user_id()
    };

    if store.farm_of_owner(owner).await?.is_some() {
        return Err(ApiError::Validation(format!("User {} already owns a farm.", owner)).into());
    }
    Ok(owner)
}

/// Farm of a new plot. Users get their own farm forced upon the plot.
pub async fn plot_farm(
    store: &dyn Store,
    principal: &Principal,
    requested: Option<i32>,
) -> Result<i32, ServiceError> {
    if principal.is_admin() {
        let farm_id =
            requested.ok_or_else(|| ApiError::Validation("farm is required".to_owned()))?;
        return match store.farm(farm_id).await? {
            Some(farm) => Ok(farm.id),
            None => Err(ApiError::Validation(format!("farm {} does not exist", farm_id)).into()),
        };
    }

    match store.farm_of_owner(principal.user_id()).await? {
        Some(farm) => {
            if let Some(ignored) = requested.filter(|id| *id != farm.id) {
                debug!(requested_farm = ignored, farm_id = farm.id, "Overriding farm of plot");
            }
            Ok(farm.id)
        }
        None => Err(ApiError::Validation("No farm found for this user.".to_owned()).into()),
    }
}

/// Plot of a new reading, which has to be named explicitly
pub async fn reading_plot(
    store: &dyn Store,
    principal: &Principal,
    requested: Option<i32>,
) -> Result<FieldPlot, ServiceError> {
    let plot_id = requested.ok_or_else(|| ApiError::Validation("plot is required".to_owned()))?;
    let plot = store
        .plot(plot_id)
        .await?
        .ok_or_else(|| ApiError::Validation(format!("plot {} does not exist", plot_id)))?;

    if !can_access(principal, &plot) {
        return Err(ApiError::Forbidden(FieldPlot::RESOURCE, plot_id).into());
    }
    Ok(plot)
}
