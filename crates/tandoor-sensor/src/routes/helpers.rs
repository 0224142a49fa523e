use std::{future::Future, pin::Pin};

use tandoor_meal_api::TandoorError;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};

use crate::{
    config::EntryConfig,
    sensor::{setup_platform, SensorState},
};

use super::SharedSensor;

pub trait Pinable: Sized {
    fn pin(self) -> Pin<Box<Self>> { Box::pin(self) }
}

impl<F: Future> Pinable for F {}

pub async fn register_jobs<'a, F>(
    reg: impl FnOnce(JobScheduler) -> F + 'a,
) where F: Future<Output = Result<JobScheduler, JobSchedulerError>>
{
    if let Err(err) = async {
        tracing::info!("starting poll job");
        let shed = JobScheduler::new().await?;
        let shed = reg(shed).await?;
        shed.start().await?;

        tracing::info!("started poll job");
        Ok::<_, JobSchedulerError>(())
    }.await {
        tracing::error!("could not start poll job: {err}");
    }
}

/// sets up the sensor for `entry` and runs its first update
pub async fn activate(sensor: &SharedSensor, entry: &EntryConfig) {
    match setup_platform(entry).await {
        Ok(Some(mut new)) => {
            if let Err(err) = new.update().await {
                tracing::warn!("first update of {} failed: {err}", new.name());
            }
            *sensor.write().await = Some(new);
        },
        Ok(None) => {},
        Err(err) => {
            tracing::error!("could not set up tandoor sensor: {err}");
            tracing::error!(
                "entry {} is stored but has no sensor, restart once tandoor is reachable",
                entry.title(),
            );
        },
    }
}

/// `Ok(None)` when no sensor is registered
///
/// the fetch runs without holding the lock so readers are not blocked by tandoor
pub async fn poll(sensor: &SharedSensor) -> Result<Option<SensorState>, TandoorError> {
    let Some(source) = sensor.read().await.as_ref().map(|s| s.source()) else {
        return Ok(None);
    };

    let fetched = source.fetch().await?;

    let mut guard = sensor.write().await;
    let Some(sensor) = guard.as_mut() else {
        return Ok(None);
    };
    sensor.apply(fetched);
    Ok(Some(sensor.snapshot()))
}
