use crate::services::providers::ProviderError;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// The directory and metering calls a refresh cycle depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Limits,
    Relays,
    DateSurpassed,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::Limits => "limits",
            Upstream::Relays => "relays",
            Upstream::DateSurpassed => "first date surpassed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unexpected status code in {0}: {1}")]
    UnexpectedStatus(Upstream, StatusCode),

    #[error("error fetching management token from Auth0: {0}")]
    Auth0Token(StatusCode),

    #[error("error fetching user from Auth0: {0}")]
    Auth0User(StatusCode),

    #[error("user not found in Auth0")]
    UserNotFound,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a refresh cycle was abandoned. The published snapshot is untouched
/// whenever one of these is returned.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("err in get_app_limits: {0}")]
    Limits(#[source] ClientError),

    #[error("err in get_relays_count: {0}")]
    Relays(#[source] ClientError),

    #[error("err in set_first_date_surpassed: {0}")]
    Persist(#[source] ClientError),
}

impl RefreshError {
    pub fn stage(&self) -> &'static str {
        match self {
            RefreshError::Limits(_) => "limits",
            RefreshError::Relays(_) => "relays",
            RefreshError::Persist(_) => "persist",
        }
    }

    pub fn client_error(&self) -> &ClientError {
        match self {
            RefreshError::Limits(e) | RefreshError::Relays(e) | RefreshError::Persist(e) => e,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("error creating notification usage map: {0}")]
    Identity(#[source] ClientError),

    #[error("error sending notification email for app {app_id}: {source}")]
    Dispatch {
        app_id: String,
        #[source]
        source: ProviderError,
    },
}
