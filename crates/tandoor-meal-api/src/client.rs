use std::{str::FromStr, time::Duration};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::StatusCode;

use crate::{raw, MealPlanRecord};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TIME_ZONE: &str = "US/Mountain";

#[derive(Debug, thiserror::Error)]
pub enum TandoorError {
    #[error("could not reach tandoor: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("tandoor responded with {status} for {url}")]
    Status { status: u16, url: String },
    #[error("InvalidPlan: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),
}

impl TandoorError {
    pub fn is_connect(&self) -> bool {
        matches!(self, TandoorError::Connect(_))
    }

    fn transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TandoorError::Request(err)
        } else {
            TandoorError::Connect(err)
        }
    }
}

pub fn parse_time_zone(name: &str) -> Result<Tz, TandoorError> {
    Tz::from_str(name).map_err(|_| TandoorError::InvalidTimeZone(name.into()))
}

/// client for the two tandoor endpoints the sensor needs
///
/// keeps no meal plan state, every fetch builds a new record
#[derive(Debug, Clone)]
pub struct Tandoor {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl Tandoor {
    pub fn new(
        url: impl Into<String>, api_key: impl Into<String>,
    ) -> Result<Self, TandoorError> {
        let url = url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TandoorError::Request)?;

        Ok(Self { url, api_key: api_key.into(), client })
    }

    pub fn url(&self) -> &str { &self.url }

    /// one-shot probe without keeping the client around
    pub async fn test(
        url: impl Into<String>, api_key: impl Into<String>,
    ) -> Result<bool, TandoorError> {
        Self::new(url, api_key)?.test_connection().await
    }

    /// `true` only for a 200 on `/api/`, other statuses are not errors
    pub async fn test_connection(&self) -> Result<bool, TandoorError> {
        tracing::debug!("tandoor test started for {}", self.url);

        let response = self.client.get(format!("{}/api/", self.url))
            .bearer_auth(&self.api_key)
            .send().await
        .map_err(TandoorError::transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("tandoor test got {status}");
        }
        Ok(status == StatusCode::OK)
    }

    pub async fn fetch_today_meal_plan(
        &self, time_zone: Tz,
    ) -> Result<Option<MealPlanRecord>, TandoorError> {
        let today = Utc::now().with_timezone(&time_zone).date_naive();
        self.fetch_meal_plan(today).await
    }

    /// `Ok(None)` when tandoor rejects the key or the meal plan endpoint is missing
    pub async fn fetch_meal_plan(
        &self, date: NaiveDate,
    ) -> Result<Option<MealPlanRecord>, TandoorError> {
        let query = raw::MealPlanQuery::day(date);
        let url = format!("{}/api/meal-plan/", self.url);
        tracing::debug!("getting meal plan for {}", query.from_date());

        let response = self.client.get(&url)
            .bearer_auth(&self.api_key)
            .query(&query)
            .send().await
        .map_err(TandoorError::transport)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                tracing::error!("bad api key for tandoor at {}", self.url);
                return Ok(None);
            },
            StatusCode::NOT_FOUND => {
                tracing::error!("unable to get to tandoor meal plan at {url}");
                return Ok(None);
            },
            status if !status.is_success() => {
                return Err(TandoorError::Status { status: status.as_u16(), url });
            },
            _ => {},
        }

        let body = response.bytes().await.map_err(TandoorError::transport)?;
        let entries: Vec<raw::ApiPlanEntry> = serde_json::from_slice(&body)?;
        tracing::debug!("got {} meal plan entries", entries.len());

        Ok(Some(MealPlanRecord::from_entries(entries, &self.url)))
    }
}
