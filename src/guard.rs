// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Admission control for navigation between destinations.

use std::{fmt, ops::BitOr};

use serde::Deserialize;

use crate::{client::Client, credential::Credential, session, storage};

/// What a destination asks of the session before it may be entered.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Requirements {
    #[serde(default)]
    pub(crate) requires_auth: bool,
    #[serde(default, alias = "requiresAdmin")]
    pub(crate) requires_privileged: bool,
}

impl Requirements {
    pub(crate) const NONE: Self = Self {
        requires_auth: false,
        requires_privileged: false,
    };
    pub(crate) const AUTHENTICATED: Self = Self {
        requires_auth: true,
        requires_privileged: false,
    };
    pub(crate) const PRIVILEGED: Self = Self {
        requires_auth: true,
        requires_privileged: true,
    };

    // A privileged destination is never open to anonymous visitors, whether or
    // not it also says so.
    const fn needs_credential(self) -> bool {
        self.requires_auth || self.requires_privileged
    }
}

impl BitOr for Requirements {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            requires_auth: self.requires_auth || rhs.requires_auth,
            requires_privileged: self.requires_privileged || rhs.requires_privileged,
        }
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requires_privileged {
            f.write_str("privileged")
        } else if self.requires_auth {
            f.write_str("signed in")
        } else {
            f.write_str("public")
        }
    }
}

/// Where a refused navigation is sent instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Redirect {
    Login,
    DefaultAuthenticated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Allow,
    RedirectTo(Redirect),
}

/// Decides whether a destination with `requirements` may be entered.
///
/// Never fails. If the profile has to be loaded and the portal refuses the
/// credential, the store logs itself out and the decision is made from what
/// is left.
pub(crate) async fn admit<S, C>(
    store: &mut session::Store<S, C>,
    requirements: Requirements,
) -> Decision
where
    S: storage::Storage<Credential>,
    C: Client,
{
    if !requirements.needs_credential() {
        return Decision::Allow;
    }

    if !store.is_authenticated() {
        return Decision::RedirectTo(Redirect::Login);
    }

    if !requirements.requires_privileged {
        return Decision::Allow;
    }

    if store.identity().is_none() {
        // The store has already logged out if this fails.
        let _ = store.fetch_identity().await;
    }

    if store.is_privileged() {
        Decision::Allow
    } else if store.is_authenticated() {
        Decision::RedirectTo(Redirect::DefaultAuthenticated)
    } else {
        Decision::RedirectTo(Redirect::Login)
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::Result, session::testing::*, storage::Memory};

    use super::*;

    async fn anonymous(client: Scripted) -> session::Store<Memory<Credential>, Scripted> {
        session::Store::restore(Memory::new(), client, "admin").await
    }

    #[tokio::test]
    async fn open_destination_always_allowed() -> Result<()> {
        let mut store = anonymous(Scripted::new("T1", "alice", &["user"])).await;
        assert_eq!(admit(&mut store, Requirements::NONE).await, Decision::Allow);

        let (mut store, _) = restored("T1", Scripted::new("T1", "alice", &["user"])).await?;
        assert_eq!(admit(&mut store, Requirements::NONE).await, Decision::Allow);
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_visitor_sent_to_login() {
        let client = Scripted::new("T1", "root", &["admin"]);
        let identity_calls = client.identity_calls.clone();
        let mut store = anonymous(client).await;

        for requirements in [
            Requirements::AUTHENTICATED,
            Requirements::PRIVILEGED,
            Requirements {
                requires_auth: false,
                requires_privileged: true,
            },
        ] {
            assert_eq!(
                admit(&mut store, requirements).await,
                Decision::RedirectTo(Redirect::Login)
            );
        }
        assert_eq!(identity_calls.count(), 0);
    }

    #[tokio::test]
    async fn credential_is_enough_for_authenticated_destination() -> Result<()> {
        let client = Scripted::new("T1", "alice", &["user"]).rejecting_identity();
        let identity_calls = client.identity_calls.clone();
        let (mut store, _) = restored("T1", client).await?;

        assert_eq!(
            admit(&mut store, Requirements::AUTHENTICATED).await,
            Decision::Allow
        );
        assert_eq!(identity_calls.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn admin_destination_fetches_identity_once() -> Result<()> {
        let client = Scripted::new("T1", "root", &["admin"]);
        let identity_calls = client.identity_calls.clone();
        let (mut store, _) = restored("T1", client).await?;

        assert_eq!(admit(&mut store, Requirements::PRIVILEGED).await, Decision::Allow);
        assert_eq!(identity_calls.count(), 1);

        assert_eq!(admit(&mut store, Requirements::PRIVILEGED).await, Decision::Allow);
        assert_eq!(identity_calls.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn ordinary_user_sent_to_default() -> Result<()> {
        let (mut store, _) = restored("T1", Scripted::new("T1", "alice", &["user"])).await?;

        assert_eq!(
            admit(&mut store, Requirements::PRIVILEGED).await,
            Decision::RedirectTo(Redirect::DefaultAuthenticated)
        );
        assert!(store.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credential_sent_to_login() -> Result<()> {
        let client = Scripted::new("T1", "root", &["admin"]).rejecting_identity();
        let identity_calls = client.identity_calls.clone();
        let (mut store, mut slot) = restored("stale", client).await?;

        assert_eq!(
            admit(&mut store, Requirements::PRIVILEGED).await,
            Decision::RedirectTo(Redirect::Login)
        );
        assert_eq!(identity_calls.count(), 1);
        assert!(!store.is_authenticated());
        assert_eq!(storage::Storage::get(&mut slot).await?, None);

        // The next attempt stops at the missing credential.
        assert_eq!(
            admit(&mut store, Requirements::AUTHENTICATED).await,
            Decision::RedirectTo(Redirect::Login)
        );
        assert_eq!(identity_calls.count(), 1);
        Ok(())
    }

    #[test]
    fn requirements_combine() {
        assert_eq!(
            Requirements::AUTHENTICATED | Requirements::PRIVILEGED,
            Requirements::PRIVILEGED
        );
        assert_eq!(Requirements::NONE | Requirements::NONE, Requirements::NONE);
    }

    #[test]
    fn requirements_accept_portal_metadata() -> std::result::Result<(), serde_json::Error> {
        let requirements: Requirements =
            serde_json::from_str(r#"{ "requiresAuth": true, "requiresAdmin": true }"#)?;
        assert_eq!(requirements, Requirements::PRIVILEGED);
        Ok(())
    }
}
