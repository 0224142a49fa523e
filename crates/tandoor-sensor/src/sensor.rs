use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tandoor_meal_api::{parse_time_zone, MealPlanRecord, Tandoor, TandoorError};

use crate::config::EntryConfig;

pub const ROUNDING_PRECISION: i32 = 1;

/// probes tandoor and only hands out a sensor if the key is accepted
pub async fn setup_platform(
    entry: &EntryConfig,
) -> Result<Option<MealPlanSensor>, TandoorError> {
    let time_zone = parse_time_zone(&entry.time_zone)?;
    tracing::debug!("using time zone {}", time_zone.name());

    let client = Tandoor::new(&entry.url, &entry.api_key)?;
    if client.test_connection().await? {
        tracing::info!("registering sensor for {}", client.url());
        Ok(Some(MealPlanSensor::new(client, time_zone)))
    } else {
        tracing::error!("tandoor at {} rejected the probe, no sensor registered", entry.url);
        Ok(None)
    }
}

/// today's meal as a single polled value
pub struct MealPlanSensor {
    name: String,
    client: Tandoor,
    time_zone: Tz,
    record: Option<MealPlanRecord>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub name: String,
    pub state: Option<f64>,
    pub attributes: Option<MealPlanRecord>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl MealPlanSensor {
    pub fn new(client: Tandoor, time_zone: Tz) -> Self {
        Self {
            name: format!("Tandoor_{}", client.url()),
            client,
            time_zone,
            record: None,
            last_updated: None,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    /// `recipe_id` of the held record, rounded
    pub fn state(&self) -> Option<f64> {
        let id = self.record.as_ref()?.recipe_id?;
        let scale = 10f64.powi(ROUNDING_PRECISION);
        Some((id as f64 * scale).round() / scale)
    }

    pub fn attributes(&self) -> Option<&MealPlanRecord> {
        self.record.as_ref()
    }

    pub fn source(&self) -> PlanSource {
        PlanSource {
            client: self.client.clone(),
            time_zone: self.time_zone,
        }
    }

    pub fn snapshot(&self) -> SensorState {
        SensorState {
            name: self.name.clone(),
            state: self.state(),
            attributes: self.attributes().cloned(),
            last_updated: self.last_updated,
        }
    }

    /// the held record is only replaced on a fresh plan
    pub fn apply(&mut self, fetched: Option<MealPlanRecord>) {
        match fetched {
            Some(record) => {
                tracing::debug!("new meal plan record: {record:?}");
                self.record = Some(record);
                self.last_updated = Some(Utc::now());
            },
            None => tracing::warn!("no meal plan data for {}, keeping last value", self.name),
        }
    }

    /// one poll
    pub async fn update(&mut self) -> Result<(), TandoorError> {
        let fetched = self.source().fetch().await?;
        self.apply(fetched);
        Ok(())
    }
}

/// what a poll needs to fetch, detached from the sensor
pub struct PlanSource {
    client: Tandoor,
    time_zone: Tz,
}

impl PlanSource {
    pub async fn fetch(&self) -> Result<Option<MealPlanRecord>, TandoorError> {
        self.client.fetch_today_meal_plan(self.time_zone).await
    }
}
