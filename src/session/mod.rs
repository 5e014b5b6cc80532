// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The session: who is signed in, what they may do, and the durable copy of
//! their credential.
//!
//! All state changes go through [`Store`]. Every path that fails ends with the
//! session fully logged out, never with a credential in memory that the
//! durable slot does not also hold.

pub(crate) mod observer;
#[cfg(test)]
pub(crate) mod testing;

use log::{error, warn};
use secrecy::SecretString;

use crate::{
    client::Client,
    credential::Credential,
    error::{self, Result},
    identity::Identity,
    storage,
};

use observer::{Event, LogObserver, Observer};

pub(crate) struct Store<Storage, PortalClient> {
    storage: Storage,
    client: PortalClient,
    observer: Box<dyn Observer>,
    privileged_role: String,
    credential: Option<Credential>,
    identity: Option<Identity>,
}

impl<Storage: storage::Storage<Credential>, PortalClient: Client> Store<Storage, PortalClient> {
    /// Picks up the credential left in `storage` by an earlier run, if any.
    /// The identity is not fetched; that happens when something first needs
    /// it.
    pub(crate) async fn restore<R: Into<String>>(
        mut storage: Storage,
        client: PortalClient,
        privileged_role: R,
    ) -> Self {
        let credential = match storage.get().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Discarding the saved credential because we could not read it: {}", e);
                if let Err(e) = storage.clear().await {
                    error!("Could not remove the saved credential: {}", e);
                }
                None
            }
        };

        Self {
            storage,
            client,
            observer: Box::new(LogObserver),
            privileged_role: privileged_role.into(),
            credential,
            identity: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_observer<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub(crate) const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub(crate) const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn privileged_role(&self) -> &str {
        &self.privileged_role
    }

    pub(crate) const fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    pub(crate) fn is_privileged(&self) -> bool {
        self.identity
            .as_ref()
            .map_or(false, |identity| identity.has_role(&self.privileged_role))
    }

    pub(crate) fn is_persistent(&self) -> bool {
        self.storage.is_persistent()
    }

    /// Exchanges a user name and password for a credential.
    ///
    /// A rejected sign-in also ends whatever session was active before. Once
    /// the credential is issued the profile is loaded too, but failing to
    /// load it does not fail the sign-in.
    pub(crate) async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), error::Auth> {
        self.observer.observe(Event::LoginAttempted { username });

        let result = match self.client.authenticate(username, password).await {
            Ok(credential) => self.replace_credential(credential).await,
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            self.reset().await;
            self.observer.observe(Event::LoginFailed { username, error: e });
            return result;
        }
        self.observer.observe(Event::LoginSucceeded { username });

        if let Err(e) = self.load_identity().await {
            self.observer.observe(Event::IdentityRejected { error: &e });
        }
        Ok(())
    }

    /// Loads the profile for the current credential. Without a credential
    /// there is nothing to do. If the portal refuses the credential the
    /// session is logged out.
    pub(crate) async fn fetch_identity(&mut self) -> Result<(), error::Auth> {
        if let Err(e) = self.load_identity().await {
            self.observer.observe(Event::IdentityRejected { error: &e });
            self.logout().await;
            return Err(e);
        }
        Ok(())
    }

    pub(crate) async fn logout(&mut self) {
        self.reset().await;
        self.observer.observe(Event::LoggedOut);
    }

    async fn load_identity(&mut self) -> Result<(), error::Auth> {
        let Some(ref credential) = self.credential else {
            return Ok(());
        };

        let identity = self.client.fetch_identity(credential).await?;
        self.observer.observe(Event::IdentityFetched {
            identity: &identity,
        });
        self.identity = Some(identity);
        Ok(())
    }

    async fn replace_credential(&mut self, credential: Credential) -> Result<(), error::Auth> {
        self.identity = None;
        self.storage.update(&credential).await.map_err(|e| {
            error!("Could not save the credential: {}", e);
            error::Auth::AuthenticationFailed(format!("could not save the credential: {e}"))
        })?;
        self.credential = Some(credential);
        Ok(())
    }

    async fn reset(&mut self) {
        self.credential = None;
        self.identity = None;
        if let Err(e) = self.storage.clear().await {
            error!("Could not remove the saved credential: {}", e);
        }
    }
}
