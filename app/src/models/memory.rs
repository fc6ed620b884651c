use super::*;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Tables {
    farms: BTreeMap<i32, FarmProfile>,
    plots: BTreeMap<i32, FieldPlot>,
    readings: BTreeMap<i32, SensorReading>,
    anomalies: BTreeMap<i32, AnomalyEvent>,
    recommendations: BTreeMap<i32, AgentRecommendation>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn remove_plot_children(&mut self, plot_ids: &[i32]) {
        self.readings
            .retain(|_, reading| !plot_ids.contains(&reading.plot));
        let anomaly_ids: Vec<i32> = self
            .anomalies
            .values()
            .filter(|anomaly| plot_ids.contains(&anomaly.plot))
            .map(|anomaly| anomaly.id)
            .collect();
        self.anomalies
            .retain(|id, _| !anomaly_ids.contains(id));
        self.recommendations
            .retain(|_, rec| !anomaly_ids.contains(&rec.anomaly_event));
    }
}

/// Process local store, used when no database is configured and in tests.
///
/// All tables sit behind one lock, so every operation sees a consistent
/// ownership chain. Ids are handed out from a single sequence.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn scoped<T, F>(records: &BTreeMap<i32, T>, scope: Scope, matches: F) -> Vec<T>
where
    T: Scoped + Clone,
    F: Fn(&T) -> bool,
{
    records
        .values()
        .filter(|record| scope.admits(*record) && matches(record))
        .cloned()
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn check(&self) -> Result<(), DBError> {
        Ok(())
    }

    async fn count_farms(&self) -> Result<i64, DBError> {
        Ok(self.tables.read().farms.len() as i64)
    }

    async fn farms(&self, scope: Scope, filter: &FarmFilter) -> Result<Vec<FarmProfile>, DBError> {
        let tables = self.tables.read();
        Ok(scoped(&tables.farms, scope, |farm| filter.matches(farm)))
    }

    async fn farm(&self, id: i32) -> Result<Option<FarmProfile>, DBError> {
        Ok(self.tables.read().farms.get(&id).cloned())
    }

    async fn farm_of_owner(&self, owner: UserId) -> Result<Option<FarmProfile>, DBError> {
        let tables = self.tables.read();
        Ok(tables
            .farms
            .values()
            .find(|farm| farm.owner == owner)
            .cloned())
    }

    async fn insert_farm(&self, new_farm: NewFarm) -> Result<FarmProfile, DBError> {
        let mut tables = self.tables.write();
        if tables.farms.values().any(|farm| farm.owner == new_farm.owner) {
            return Err(DBError::Duplicate(format!(
                "User {} already owns a farm.",
                new_farm.owner
            )));
        }

        let farm = FarmProfile {
            id: tables.next_id(),
            owner: new_farm.owner,
            name: new_farm.name,
            location: new_farm.location,
            size: new_farm.size,
            crop_type: new_farm.crop_type,
            created_at: Utc::now(),
        };
        tables.farms.insert(farm.id, farm.clone());
        Ok(farm)
    }

    async fn update_farm(
        &self,
        id: i32,
        update: FarmUpdate,
    ) -> Result<Option<FarmProfile>, DBError> {
        let mut tables = self.tables.write();
        Ok(tables.farms.get_mut(&id).map(|farm| {
            farm.name = update.name;
            farm.location = update.location;
            farm.size = update.size;
            farm.crop_type = update.crop_type;
            farm.clone()
        }))
    }

    async fn delete_farm(&self, id: i32) -> Result<bool, DBError> {
        let mut tables = self.tables.write();
        if tables.farms.remove(&id).is_none() {
            return Ok(false);
        }
        let plot_ids: Vec<i32> = tables
            .plots
            .values()
            .filter(|plot| plot.farm == id)
            .map(|plot| plot.id)
            .collect();
        tables.plots.retain(|_, plot| plot.farm != id);
        tables.remove_plot_children(&plot_ids);
        Ok(true)
    }

    async fn plots(&self, scope: Scope, filter: &PlotFilter) -> Result<Vec<FieldPlot>, DBError> {
        let tables = self.tables.read();
        Ok(scoped(&tables.plots, scope, |plot| filter.matches(plot)))
    }

    async fn plot(&self, id: i32) -> Result<Option<FieldPlot>, DBError> {
        Ok(self.tables.read().plots.get(&id).cloned())
    }

    async fn insert_plot(&self, new_plot: NewPlot) -> Result<FieldPlot, DBError> {
        let mut tables = self.tables.write();
        let owner = match tables.farms.get(&new_plot.farm) {
            Some(farm) => farm.owner,
            None => {
                return Err(DBError::MissingParent(format!(
                    "farm {} does not exist",
                    new_plot.farm
                )))
            }
        };

        let plot = FieldPlot {
            id: tables.next_id(),
            farm: new_plot.farm,
            name: new_plot.name,
            crop_variety: new_plot.crop_variety,
            size: new_plot.size,
            location_coordinates: new_plot.location_coordinates,
            owner,
        };
        tables.plots.insert(plot.id, plot.clone());
        Ok(plot)
    }

    async fn update_plot(&self, id: i32, update: PlotUpdate) -> Result<Option<FieldPlot>, DBError> {
        let mut tables = self.tables.write();
        Ok(tables.plots.get_mut(&id).map(|plot| {
            plot.name = update.name;
            plot.crop_variety = update.crop_variety;
            plot.size = update.size;
            plot.location_coordinates = update.location_coordinates;
            plot.clone()
        }))
    }

    async fn delete_plot(&self, id: i32) -> Result<bool, DBError> {
        let mut tables = self.tables.write();
        if tables.plots.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_plot_children(&[id]);
        Ok(true)
    }

    async fn readings(
        &self,
        scope: Scope,
        filter: &ReadingFilter,
    ) -> Result<Vec<SensorReading>, DBError> {
        let tables = self.tables.read();
        let mut readings = scoped(&tables.readings, scope, |reading| filter.matches(reading));
        readings.sort_by(|left, right| {
            right
                .timestamp
                .cmp(&left.timestamp)
                .then(right.id.cmp(&left.id))
        });
        Ok(readings)
    }

    async fn reading(&self, id: i32) -> Result<Option<SensorReading>, DBError> {
        Ok(self.tables.read().readings.get(&id).cloned())
    }

    async fn insert_reading(&self, new_reading: NewReading) -> Result<SensorReading, DBError> {
        let mut tables = self.tables.write();
        let (farm, owner) = match tables.plots.get(&new_reading.plot) {
            Some(plot) => (plot.farm, plot.owner),
            None => {
                return Err(DBError::MissingParent(format!(
                    "plot {} does not exist",
                    new_reading.plot
                )))
            }
        };

        let reading = SensorReading {
            id: tables.next_id(),
            plot: new_reading.plot,
            sensor_type: new_reading.sensor_type,
            value: new_reading.value,
            timestamp: Utc::now(),
            source: new_reading.source,
            farm,
            owner,
        };
        tables.readings.insert(reading.id, reading.clone());
        Ok(reading)
    }

    async fn update_reading(
        &self,
        id: i32,
        update: ReadingUpdate,
    ) -> Result<Option<SensorReading>, DBError> {
        let mut tables = self.tables.write();
        Ok(tables.readings.get_mut(&id).map(|reading| {
            reading.sensor_type = update.sensor_type;
            reading.value = update.value;
            reading.source = update.source;
            reading.clone()
        }))
    }

    async fn delete_reading(&self, id: i32) -> Result<bool, DBError> {
        Ok(self.tables.write().readings.remove(&id).is_some())
    }

    async fn anomalies(
        &self,
        scope: Scope,
        filter: &AnomalyFilter,
    ) -> Result<Vec<AnomalyEvent>, DBError> {
        let tables = self.tables.read();
        Ok(scoped(&tables.anomalies, scope, |anomaly| {
            filter.matches(anomaly)
        }))
    }

    async fn anomaly(&self, id: i32) -> Result<Option<AnomalyEvent>, DBError> {
        Ok(self.tables.read().anomalies.get(&id).cloned())
    }

    async fn insert_anomaly(&self, new_anomaly: NewAnomaly) -> Result<AnomalyEvent, DBError> {
        let mut tables = self.tables.write();
        let (farm, owner) = match tables.plots.get(&new_anomaly.plot) {
            Some(plot) => (plot.farm, plot.owner),
            None => {
                return Err(DBError::MissingParent(format!(
                    "plot {} does not exist",
                    new_anomaly.plot
                )))
            }
        };

        let anomaly = AnomalyEvent {
            id: tables.next_id(),
            plot: new_anomaly.plot,
            anomaly_type: new_anomaly.anomaly_type,
            severity: new_anomaly.severity,
            model_confidence: new_anomaly.model_confidence,
            detected_at: Utc::now(),
            farm,
            owner,
        };
        tables.anomalies.insert(anomaly.id, anomaly.clone());
        Ok(anomaly)
    }

    async fn recommendations(
        &self,
        scope: Scope,
        filter: &RecommendationFilter,
    ) -> Result<Vec<AgentRecommendation>, DBError> {
        let tables = self.tables.read();
        Ok(scoped(&tables.recommendations, scope, |rec| {
            filter.matches(rec)
        }))
    }

    async fn recommendation(&self, id: i32) -> Result<Option<AgentRecommendation>, DBError> {
        Ok(self.tables.read().recommendations.get(&id).cloned())
    }

    async fn insert_recommendation(
        &self,
        new_recommendation: NewRecommendation,
    ) -> Result<AgentRecommendation, DBError> {
        let mut tables = self.tables.write();
        let (farm, owner) = match tables.anomalies.get(&new_recommendation.anomaly_event) {
            Some(anomaly) => (anomaly.farm, anomaly.owner),
            None => {
                return Err(DBError::MissingParent(format!(
                    "anomaly {} does not exist",
                    new_recommendation.anomaly_event
                )))
            }
        };

        let recommendation = AgentRecommendation {
            id: tables.next_id(),
            anomaly_event: new_recommendation.anomaly_event,
            recommended_action: new_recommendation.recommended_action,
            explanation_text: new_recommendation.explanation_text,
            confidence: new_recommendation.confidence,
            generated_at: Utc::now(),
            farm,
            owner,
        };
        tables
            .recommendations
            .insert(recommendation.id, recommendation.clone());
        Ok(recommendation)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn new_farm(owner: UserId, name: &str) -> NewFarm {
        NewFarm {
            owner,
            name: name.to_owned(),
            location: "Valley".to_owned(),
            size: 10.0,
            crop_type: "wheat".to_owned(),
        }
    }

    fn new_plot(farm: i32, name: &str) -> NewPlot {
        NewPlot {
            farm,
            name: name.to_owned(),
            crop_variety: "durum".to_owned(),
            size: 2.5,
            location_coordinates: None,
        }
    }

    fn new_reading(plot: i32, value: f64) -> NewReading {
        NewReading {
            plot,
            sensor_type: SensorKind::Moisture,
            value,
            source: "simulator".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_second_farm_for_owner_is_rejected() {
        // Prepare
        let store = MemoryStore::new();
        store.insert_farm(new_farm(1, "Green Acres")).await.unwrap();

        // Execute
        let res = store.insert_farm(new_farm(1, "Second")).await;

        // Validate
        assert!(matches!(res, Err(DBError::Duplicate(_))));
        assert_eq!(store.count_farms().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_children_carry_resolved_owner() {
        // Prepare
        let store = MemoryStore::new();
        let farm = store.insert_farm(new_farm(7, "Green Acres")).await.unwrap();

        // Execute
        let plot = store.insert_plot(new_plot(farm.id, "North")).await.unwrap();
        let reading = store.insert_reading(new_reading(plot.id, 0.4)).await.unwrap();
        let anomaly = store
            .insert_anomaly(NewAnomaly {
                plot: plot.id,
                anomaly_type: AnomalyKind::MoistureDrop,
                severity: Severity::High,
                model_confidence: 0.9,
            })
            .await
            .unwrap();
        let rec = store
            .insert_recommendation(NewRecommendation {
                anomaly_event: anomaly.id,
                recommended_action: "Irrigate".to_owned(),
                explanation_text: "Moisture dropped".to_owned(),
                confidence: "high".to_owned(),
            })
            .await
            .unwrap();

        // Validate
        assert_eq!((plot.farm, plot.owner), (farm.id, 7));
        assert_eq!((reading.farm, reading.owner), (farm.id, 7));
        assert_eq!((anomaly.farm, anomaly.owner), (farm.id, 7));
        assert_eq!((rec.farm, rec.owner), (farm.id, 7));
    }

    #[tokio::test]
    async fn test_missing_parent() {
        let store = MemoryStore::new();

        let plot = store.insert_plot(new_plot(42, "Orphan")).await;
        let reading = store.insert_reading(new_reading(42, 0.1)).await;

        assert!(matches!(plot, Err(DBError::MissingParent(msg)) if msg == "farm 42 does not exist"));
        assert!(matches!(reading, Err(DBError::MissingParent(msg)) if msg == "plot 42 does not exist"));
    }

    #[tokio::test]
    async fn test_delete_farm_cascades() {
        // Prepare
        let store = MemoryStore::new();
        let farm = store.insert_farm(new_farm(1, "Green Acres")).await.unwrap();
        let other = store.insert_farm(new_farm(2, "Other")).await.unwrap();
        let plot = store.insert_plot(new_plot(farm.id, "North")).await.unwrap();
        let kept = store.insert_plot(new_plot(other.id, "South")).await.unwrap();
        store.insert_reading(new_reading(plot.id, 0.2)).await.unwrap();
        store.insert_reading(new_reading(kept.id, 0.3)).await.unwrap();

        // Execute
        let deleted = store.delete_farm(farm.id).await.unwrap();

        // Validate
        assert!(deleted);
        assert!(store.plot(plot.id).await.unwrap().is_none());
        let readings = store
            .readings(Scope::All, &ReadingFilter::default())
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].plot, kept.id);
        assert!(!store.delete_farm(farm.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_scope_and_ordering() {
        // Prepare
        let store = MemoryStore::new();
        let farm_a = store.insert_farm(new_farm(1, "A")).await.unwrap();
        let farm_b = store.insert_farm(new_farm(2, "B")).await.unwrap();
        let plot_a = store.insert_plot(new_plot(farm_a.id, "PA")).await.unwrap();
        let plot_b = store.insert_plot(new_plot(farm_b.id, "PB")).await.unwrap();
        let first = store.insert_reading(new_reading(plot_a.id, 0.1)).await.unwrap();
        let second = store.insert_reading(new_reading(plot_a.id, 0.2)).await.unwrap();
        store.insert_reading(new_reading(plot_b.id, 0.3)).await.unwrap();

        // Execute
        let own = store
            .readings(Scope::OwnedBy(1), &ReadingFilter::default())
            .await
            .unwrap();
        let all = store
            .readings(Scope::All, &ReadingFilter::default())
            .await
            .unwrap();

        // Validate
        assert_eq!(
            own.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_update_keeps_parent() {
        let store = MemoryStore::new();
        let farm = store.insert_farm(new_farm(1, "A")).await.unwrap();
        let plot = store.insert_plot(new_plot(farm.id, "PA")).await.unwrap();

        let updated = store
            .update_plot(
                plot.id,
                PlotUpdate {
                    name: "Renamed".to_owned(),
                    crop_variety: "spelt".to_owned(),
                    size: 3.0,
                    location_coordinates: Some("1,2".to_owned()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.farm, farm.id);
        assert_eq!(updated.owner, 1);
        assert!(store
            .update_farm(999, FarmUpdate {
                name: "x".to_owned(),
                location: "y".to_owned(),
                size: 1.0,
                crop_type: "z".to_owned(),
            })
            .await
            .unwrap()
            .is_none());
    }
}
