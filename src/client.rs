// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    credential::Credential,
    error::{self, Result},
    identity::Identity,
    metadata,
};

/// Message used when the portal rejects a sign-in without saying why.
pub(crate) const GENERIC_LOGIN_FAILURE: &str = "Login failed";

/// The portal's token-issuing and identity endpoints.
#[async_trait]
pub(crate) trait Client: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Credential, error::Auth>;

    async fn fetch_identity(&self, credential: &Credential) -> Result<Identity, error::Auth>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    // Validation failures carry a list here instead of a message.
    detail: Option<serde_json::Value>,
}

pub(crate) struct Http {
    client: reqwest::Client,
    token_url: Url,
    identity_url: Url,
}

impl Http {
    pub(crate) fn new(
        base: &Url,
        token_path: &str,
        identity_path: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(metadata::USER_AGENT.as_str())
                .timeout(timeout)
                .build()?,
            token_url: base.join(token_path)?,
            identity_url: base.join(identity_path)?,
        })
    }
}

#[async_trait]
impl Client for Http {
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Credential, error::Auth> {
        let resp = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("username", username),
                ("password", password.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Could not reach the token endpoint {}: {}", self.token_url, e);
                error::Auth::AuthenticationFailed(e.to_string())
            })?;

        let status = resp.status();
        debug!("Token endpoint answered with status {}", status);
        if !status.is_success() {
            let detail = resp
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .and_then(|detail| detail.as_str().map(str::to_owned));
            return Err(error::Auth::AuthenticationFailed(
                detail.unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_owned()),
            ));
        }

        let body = resp.json::<TokenResponse>().await.map_err(|e| {
            warn!("The token endpoint sent a response we could not read: {}", e);
            error::Auth::AuthenticationFailed(e.to_string())
        })?;
        Credential::new(body.access_token).ok_or_else(|| {
            error::Auth::AuthenticationFailed("the portal issued an empty token".to_owned())
        })
    }

    async fn fetch_identity(&self, credential: &Credential) -> Result<Identity, error::Auth> {
        let resp = self
            .client
            .get(self.identity_url.clone())
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| {
                warn!("Could not reach the identity endpoint {}: {}", self.identity_url, e);
                error::Auth::SessionInvalid
            })?;

        let status = resp.status();
        debug!("Identity endpoint answered with status {}", status);
        if !status.is_success() {
            return Err(error::Auth::SessionInvalid);
        }

        resp.json::<Identity>().await.map_err(|e| {
            warn!("The identity endpoint sent a profile we could not read: {}", e);
            error::Auth::SessionInvalid
        })
    }
}
