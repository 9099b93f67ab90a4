//! Auth0 management API calls used to find an application owner's email.

use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use service_core::http::HttpClient;

const AUTH0_TOKEN_ENDPOINT: &str = "oauth/token";
const AUTH0_USERS_ENDPOINT: &str = "api/v2/users";
const AUTH0_AUDIENCE_ENDPOINT: &str = "api/v2/";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// A bearer token for the management API.
    async fn management_token(&self) -> Result<String, ClientError>;

    /// Email address of `user_id`.
    async fn user_email(&self, user_id: &str, token: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Deserialize)]
struct Auth0Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Auth0User {
    #[serde(default)]
    email: String,
}

pub struct Auth0Client {
    http: HttpClient,
    domain: String,
    client_id: String,
    client_secret: SecretString,
}

impl Auth0Client {
    pub fn new(
        http: HttpClient,
        domain: &str,
        client_id: String,
        client_secret: SecretString,
    ) -> Self {
        Self {
            http,
            domain: domain.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    async fn management_token(&self) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.domain, AUTH0_TOKEN_ENDPOINT);
        let audience = format!("{}/{}", self.domain, AUTH0_AUDIENCE_ENDPOINT);

        let request = self.http.post(&url).form(&[
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("audience", audience.as_str()),
        ]);
        let response = self.http.send("auth0_management_token", request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::Auth0Token(response.status()));
        }

        let body = response.bytes().await?;
        let token: Auth0Token = serde_json::from_slice(&body)?;

        Ok(token.access_token)
    }

    async fn user_email(&self, user_id: &str, token: &str) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.domain, AUTH0_USERS_ENDPOINT);
        let query = format!("user_id:*{}", user_id);

        let request = self
            .http
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("fields", "email"),
                ("include_fields", "true"),
            ])
            .bearer_auth(token);
        let response = self.http.send("auth0_user_email", request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::Auth0User(response.status()));
        }

        let body = response.bytes().await?;
        let users: Vec<Auth0User> = serde_json::from_slice(&body)?;

        users
            .into_iter()
            .next()
            .map(|user| user.email)
            .filter(|email| !email.is_empty())
            .ok_or(ClientError::UserNotFound)
    }
}
