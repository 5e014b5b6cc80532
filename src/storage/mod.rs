// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod file;
#[cfg(feature = "keychain")]
mod keychain;
mod memory;
#[cfg(feature = "secret-service")]
mod secret_service;

#[cfg(feature = "secret-service")]
use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use crate::{error::Result, metadata};

pub(crate) use file::File;
#[cfg(feature = "keychain")]
pub(crate) use keychain::Keychain;
pub(crate) use memory::Memory;
#[cfg(feature = "secret-service")]
pub(crate) use secret_service::SecretService;

/// Identifies one durable slot: the portal it belongs to and what it holds.
/// Keyrings keep one slot per portal; the file backend keeps only one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Key {
    portal: String,
    name: String,
}

impl Key {
    pub(crate) fn new(portal: &Url, name: &str) -> Self {
        Self {
            portal: portal.as_str().to_owned(),
            name: name.to_owned(),
        }
    }

    pub(crate) fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }

    /// Human-readable description shown by keyring managers.
    #[cfg_attr(not(feature = "secret-service"), allow(dead_code))]
    pub(crate) fn label(&self) -> String {
        format!("{} {} for {}", *metadata::CLIENT_DISPLAY_NAME, self.name, self.portal)
    }

    #[cfg(feature = "secret-service")]
    pub(crate) fn attributes(&self) -> HashMap<&str, &str> {
        HashMap::from([
            ("portal-gate.slot", self.name.as_str()),
            ("portal-gate.url", self.portal.as_str()),
        ])
    }

    #[cfg(feature = "keychain")]
    pub(crate) fn service(&self) -> String {
        format!("{}.{}", *metadata::CLIENT_TYPE_ID, self.name)
    }

    #[cfg(feature = "keychain")]
    pub(crate) fn account(&self) -> &str {
        &self.portal
    }
}

pub(crate) trait IsPersistent {
    fn is_persistent(&self) -> bool;
}

impl<T: IsPersistent + ?Sized> IsPersistent for Box<T> {
    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }
}

/// A single durable slot.
///
/// Clearing a slot that holds nothing succeeds.
#[async_trait]
pub(crate) trait Storage<T>: Send + Sync + IsPersistent {
    async fn get(&mut self) -> Result<Option<T>>;
    async fn update(&mut self, data: &T) -> Result<()>;
    async fn clear(&mut self) -> Result<()>;
}

#[async_trait]
impl<Tn: Sync, T: Storage<Tn> + ?Sized> Storage<Tn> for Box<T> {
    async fn get(&mut self) -> Result<Option<Tn>> {
        (**self).get().await
    }

    async fn update(&mut self, data: &Tn) -> Result<()> {
        (**self).update(data).await
    }

    async fn clear(&mut self) -> Result<()> {
        (**self).clear().await
    }
}
