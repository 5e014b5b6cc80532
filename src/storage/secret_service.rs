// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::debug;
use secrecy::{ExposeSecret as _, SecretVec};
use serde::{Deserialize, Serialize};

use crate::error::{self, Result};

use super::{IsPersistent, Key, Storage};

/// A slot in the desktop keyring. Items are found by the key's attributes, so
/// each portal gets its own item.
pub(crate) struct SecretService {
    keyring: oo7::Keyring,
    key: Key,
}

impl SecretService {
    pub(crate) async fn new(key: Key) -> Result<Self> {
        let keyring = oo7::Keyring::new().await.map_err(error::Storage::from)?;
        Ok(Self { keyring, key })
    }

    async fn items(&self) -> Result<Vec<oo7::Item>> {
        Ok(self
            .keyring
            .search_items(self.key.attributes())
            .await
            .map_err(error::Storage::from)?)
    }
}

impl IsPersistent for SecretService {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: for<'de> Deserialize<'de> + Send + Serialize + Sync> Storage<T> for SecretService {
    async fn get(&mut self) -> Result<Option<T>> {
        let Some(item) = self.items().await?.into_iter().next() else {
            return Ok(None);
        };

        let secret = SecretVec::new(item.secret().await.map_err(error::Storage::from)?.to_vec());
        Ok(Some(serde_json::from_slice(secret.expose_secret())?))
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        let secret = SecretVec::new(serde_json::to_vec(data)?);
        self.keyring
            .create_item(
                &self.key.label(),
                self.key.attributes(),
                secret.expose_secret(),
                true,
            )
            .await
            .map_err(error::Storage::from)?;
        Ok(())
    }

    // Stray duplicates from older versions are removed along with the slot.
    async fn clear(&mut self) -> Result<()> {
        for item in self.items().await? {
            item.delete().await.map_err(error::Storage::from)?;
            debug!("Removed a keyring item for {}", self.key.label());
        }
        Ok(())
    }
}
