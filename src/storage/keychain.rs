// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretVec};
use security_framework::{base, passwords};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Key, Storage};

// errSecItemNotFound
const ITEM_NOT_FOUND: i32 = -25300_i32;

/// A generic password in the user's default keychain, with the portal URL as
/// the account.
pub(crate) struct Keychain {
    service: String,
    account: String,
}

impl Keychain {
    pub(crate) fn new(key: &Key) -> Result<Self> {
        // Keychain items outlive the data directory, but without one there is
        // no user profile to attach them to.
        if metadata::PROJECT_DIRS.is_none() {
            return Err(error::Storage::NoProjectDirs.into());
        }

        Ok(Self {
            service: key.service(),
            account: key.account().to_owned(),
        })
    }
}

fn found<T>(result: base::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.code() == ITEM_NOT_FOUND => Ok(None),
        Err(e) => Err(error::Storage::from(e).into()),
    }
}

impl IsPersistent for Keychain {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: for<'de> Deserialize<'de> + Send + Serialize + Sync> Storage<T> for Keychain {
    async fn get(&mut self) -> Result<Option<T>> {
        match found(passwords::get_generic_password(&self.service, &self.account))? {
            Some(secret) => {
                let secret = SecretVec::new(secret);
                Ok(Some(serde_json::from_slice(secret.expose_secret())?))
            }
            None => Ok(None),
        }
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        let secret = SecretVec::new(serde_json::to_vec(data)?);
        passwords::set_generic_password(&self.service, &self.account, secret.expose_secret())
            .map_err(error::Storage::from)?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        let _ = found(passwords::delete_generic_password(&self.service, &self.account))?;
        Ok(())
    }
}
