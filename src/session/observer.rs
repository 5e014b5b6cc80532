// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{debug, info, warn};

use crate::{error::{self}, identity::Identity};

/// Points in the life of a session that are worth reporting.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Event<'event> {
    LoginAttempted { username: &'event str },
    LoginSucceeded { username: &'event str },
    LoginFailed { username: &'event str, error: &'event error::Auth },
    IdentityFetched { identity: &'event Identity },
    IdentityRejected { error: &'event error::Auth },
    LoggedOut,
}

pub(crate) trait Observer: Send + Sync {
    fn observe(&self, event: Event<'_>);
}

impl<T: Observer + ?Sized> Observer for Box<T> {
    fn observe(&self, event: Event<'_>) {
        (**self).observe(event);
    }
}

/// Forwards session events to the `log` facade.
pub(crate) struct LogObserver;

impl Observer for LogObserver {
    fn observe(&self, event: Event<'_>) {
        match event {
            Event::LoginAttempted { username } => {
                debug!("Signing in as {}", username.escape_default());
            }
            Event::LoginSucceeded { username } => {
                info!("Signed in as {}", username.escape_default());
            }
            Event::LoginFailed { username, error } => {
                warn!("Could not sign in as {}: {}", username.escape_default(), error);
            }
            Event::IdentityFetched { identity } => {
                debug!(
                    "Loaded profile for {} with roles [{}]",
                    identity.username.escape_default(),
                    identity.roles.join(", ")
                );
            }
            Event::IdentityRejected { error } => {
                warn!("The portal did not accept the saved credential: {}", error);
            }
            Event::LoggedOut => info!("Signed out"),
        }
    }
}
