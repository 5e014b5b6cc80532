// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::json;

use crate::{
    client::Client,
    credential::Credential,
    error::{self, Result},
    identity::Identity,
    storage::{self, Storage as _},
};

use super::{observer, Store};

#[derive(Clone, Default)]
pub(crate) struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        let _ = self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A portal that answers every request the same way.
pub(crate) struct Scripted {
    token: Result<String, error::Auth>,
    identity: Result<Identity, error::Auth>,
    pub(crate) authenticate_calls: Calls,
    pub(crate) identity_calls: Calls,
}

impl Scripted {
    pub(crate) fn new(token: &str, username: &str, roles: &[&str]) -> Self {
        Self {
            token: Ok(token.to_owned()),
            identity: Ok(identity(username, roles)),
            authenticate_calls: Calls::default(),
            identity_calls: Calls::default(),
        }
    }

    pub(crate) fn rejecting_login(message: &str) -> Self {
        Self {
            token: Err(error::Auth::AuthenticationFailed(message.to_owned())),
            identity: Err(error::Auth::SessionInvalid),
            authenticate_calls: Calls::default(),
            identity_calls: Calls::default(),
        }
    }

    pub(crate) fn rejecting_identity(mut self) -> Self {
        self.identity = Err(error::Auth::SessionInvalid);
        self
    }
}

#[async_trait]
impl Client for Scripted {
    async fn authenticate(
        &self,
        _username: &str,
        _password: &SecretString,
    ) -> Result<Credential, error::Auth> {
        self.authenticate_calls.record();
        self.token.clone().and_then(|token| {
            Credential::new(token).ok_or(error::Auth::AuthenticationFailed(String::new()))
        })
    }

    async fn fetch_identity(&self, _credential: &Credential) -> Result<Identity, error::Auth> {
        self.identity_calls.record();
        self.identity.clone()
    }
}

/// Remembers a rendering of every event it sees.
#[derive(Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub(crate) fn events(&self) -> Vec<String> {
        self.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl observer::Observer for Recorder {
    fn observe(&self, event: observer::Event<'_>) {
        let rendered = match event {
            observer::Event::LoginAttempted { username } => format!("attempt {username}"),
            observer::Event::LoginSucceeded { username } => format!("success {username}"),
            observer::Event::LoginFailed { username, error } => {
                format!("failure {username}: {}", error.message())
            }
            observer::Event::IdentityFetched { identity } => {
                format!("identity {}", identity.username)
            }
            observer::Event::IdentityRejected { .. } => "rejected".to_owned(),
            observer::Event::LoggedOut => "logout".to_owned(),
        };
        if let Ok(mut events) = self.0.lock() {
            events.push(rendered);
        }
    }
}

pub(crate) fn identity(username: &str, roles: &[&str]) -> Identity {
    serde_json::from_value(json!({ "username": username, "roles": roles }))
        .unwrap_or_else(|e| panic!("test identity should deserialize: {e}"))
}

pub(crate) fn password(value: &str) -> SecretString {
    SecretString::new(value.to_owned())
}

pub(crate) fn credential(token: &str) -> Credential {
    Credential::new(token.to_owned()).unwrap_or_else(|| panic!("test token should not be empty"))
}

/// A store whose slot already holds `token`, as after a previous run.
pub(crate) async fn restored(
    token: &str,
    client: Scripted,
) -> Result<(Store<storage::Memory<Credential>, Scripted>, storage::Memory<Credential>)> {
    let slot = storage::Memory::new();
    slot.clone().update(&credential(token)).await?;
    let store = Store::restore(slot.clone(), client, "admin").await;
    Ok((store, slot))
}
