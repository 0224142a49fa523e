use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tandoor_meal_api::{Tandoor, TandoorError};

use crate::config::EntryConfig;

pub const STEP_USER: &str = "user";
pub const ALREADY_CONFIGURED: &str = "already_configured";

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("cannot connect")]
    CannotConnect,
    #[error("invalid authentication")]
    InvalidAuth,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<TandoorError> for SetupError {
    fn from(err: TandoorError) -> Self {
        if err.is_connect() {
            SetupError::CannotConnect
        } else {
            SetupError::Unknown(err.into())
        }
    }
}

impl SetupError {
    fn form_error(&self) -> &'static str {
        match self {
            SetupError::CannotConnect => "cannot_connect",
            SetupError::InvalidAuth => "invalid_auth",
            SetupError::Unknown(_) => "unknown",
        }
    }
}

/// checks whether a url + key pair can log in
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, url: &str, api_key: &str) -> Result<bool, SetupError>;
}

pub struct TandoorAuth;

#[async_trait]
impl Authenticator for TandoorAuth {
    async fn authenticate(&self, url: &str, api_key: &str) -> Result<bool, SetupError> {
        Ok(Tandoor::test(url, api_key).await?)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub url: String,
    pub api_key: String,
}

impl fmt::Debug for UserInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInput")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl From<UserInput> for EntryConfig {
    fn from(value: UserInput) -> Self {
        EntryConfig::new(value.url, value.api_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        step_id: &'static str,
        errors: BTreeMap<&'static str, &'static str>,
    },
    CreateEntry {
        title: String,
        data: UserInput,
    },
    Abort {
        reason: &'static str,
    },
}

impl FlowResult {
    fn form(errors: BTreeMap<&'static str, &'static str>) -> Self {
        FlowResult::Form { step_id: STEP_USER, errors }
    }
}

/// single step flow collecting url and api key
pub struct SetupFlow<'a> {
    auth: &'a dyn Authenticator,
    already_configured: bool,
}

impl<'a> SetupFlow<'a> {
    pub fn new(auth: &'a dyn Authenticator) -> Self {
        Self { auth, already_configured: false }
    }

    pub fn already_configured(mut self, configured: bool) -> Self {
        self.already_configured = configured;
        self
    }

    pub async fn step_user(&self, input: Option<UserInput>) -> FlowResult {
        if self.already_configured {
            return FlowResult::Abort { reason: ALREADY_CONFIGURED };
        }

        let mut errors = BTreeMap::new();
        if let Some(input) = input {
            match self.validate_input(&input).await {
                Ok(title) => return FlowResult::CreateEntry { title, data: input },
                Err(err) => {
                    if let SetupError::Unknown(err) = &err {
                        tracing::error!("unexpected error during setup: {err:?}");
                    } else {
                        tracing::info!("setup for {} failed: {err}", input.url);
                    }
                    errors.insert("base", err.form_error());
                },
            }
        }

        FlowResult::form(errors)
    }

    /// returns the entry title
    async fn validate_input(&self, input: &UserInput) -> Result<String, SetupError> {
        if !self.auth.authenticate(&input.url, &input.api_key).await? {
            return Err(SetupError::InvalidAuth);
        }

        Ok(format!("Tandoor_{}", input.url))
    }
}
