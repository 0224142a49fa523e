use std::{path::Path, sync::Arc, time::Instant};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json,
    Router,
};
use tokio::sync::RwLock;
use tokio_cron_scheduler::Job;

use crate::{
    config::{Config, EntryConfig, EntryStore, StoreError},
    sensor::{MealPlanSensor, SensorState},
    setup::{Authenticator, FlowResult, SetupFlow, TandoorAuth, UserInput, ALREADY_CONFIGURED},
};

mod helpers;
use helpers::*;

pub type SharedSensor = Arc<RwLock<Option<MealPlanSensor>>>;

type ApiError = (StatusCode, Json<String>);

#[derive(Clone, FromRef)]
struct AppState {
    sensor: SharedSensor,
    entries: EntryStore,
    auth: Arc<dyn Authenticator>,
}

impl AppState {
    async fn new(config: &Config, config_path: &Path) -> Self {
        let sensor = SharedSensor::default();

        if let Some(entry) = &config.entry {
            tracing::info!("setting up sensor from stored entry");
            activate(&sensor, entry).await;
        } else {
            tracing::info!("no entry configured, waiting for setup");
        }

        let s = sensor.clone();
        let schedule = config.scan_schedule.clone();
        register_jobs(|shed| async move {
            shed.add(Job::new_async(schedule.as_str(), move |uuid, _| {
                let s = s.clone();
                async move {
                    let start = Instant::now();
                    match poll(&s).await {
                        Ok(Some(_)) => {
                            let took = start.elapsed();
                            tracing::info!("polled tandoor (job: {uuid:?}, took {took:?})");
                        },
                        Ok(None) => tracing::debug!("no sensor registered, skipping poll"),
                        Err(err) => tracing::error!("poll failed (job: {uuid:?}): {err}"),
                    }
                }.pin()
            })?).await?;

            Ok(shed)
        }).await;

        Self {
            sensor,
            entries: EntryStore::new(config_path, config.entry.clone()),
            auth: Arc::new(TandoorAuth),
        }
    }
}

pub async fn make_router(config: &Config, config_path: &Path) -> Router {
    router().with_state(AppState::new(config, config_path).await)
}

fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sensor", get(sensor_state))
        .route("/api/sensor/update", post(sensor_update))
        .route("/api/setup", get(setup_form).post(setup_submit))
}

fn not_registered() -> ApiError {
    (StatusCode::NOT_FOUND, Json(format!("sensor_not_registered")))
}

async fn sensor_state(
    State(sensor): State<SharedSensor>,
) -> Result<Json<SensorState>, ApiError> {
    sensor.read().await
        .as_ref()
        .map(|v| Json(v.snapshot()))
    .ok_or_else(not_registered)
}

async fn sensor_update(
    State(sensor): State<SharedSensor>,
) -> Result<Json<SensorState>, ApiError> {
    match poll(&sensor).await {
        Ok(Some(state)) => Ok(Json(state)),
        Ok(None) => Err(not_registered()),
        Err(err) => {
            tracing::error!("manual update failed: {err}");
            Err((StatusCode::BAD_GATEWAY, Json(format!("update_failed"))))
        },
    }
}

async fn setup_form(State(state): State<AppState>) -> Json<FlowResult> {
    let configured = state.entries.get().await.is_some();
    Json(SetupFlow::new(state.auth.as_ref())
        .already_configured(configured)
        .step_user(None).await)
}

async fn setup_submit(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> Result<Json<FlowResult>, ApiError> {
    let configured = state.entries.get().await.is_some();
    let result = SetupFlow::new(state.auth.as_ref())
        .already_configured(configured)
        .step_user(Some(input)).await;

    if let FlowResult::CreateEntry { data, .. } = &result {
        let entry = EntryConfig::from(data.clone());
        match state.entries.create(entry.clone()).await {
            Ok(()) => activate(&state.sensor, &entry).await,
            Err(StoreError::AlreadyConfigured) => {
                tracing::warn!("entry {} lost the race to another setup", entry.title());
                return Ok(Json(FlowResult::Abort { reason: ALREADY_CONFIGURED }));
            },
            Err(err) => {
                tracing::error!("could not store entry: {err:?}");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(format!("could_not_store_entry")),
                ));
            },
        }
    }

    Ok(Json(result))
}
