// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, io, result};

use thiserror::Error;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid portal URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Auth(#[from] Auth),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("route table error: {0}")]
    Route(#[from] Route),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

/// Failures of the session itself. Every one of these leaves the session
/// logged out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Auth {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("session is no longer valid")]
    SessionInvalid,
}

impl Auth {
    /// The text to show whoever attempted to sign in.
    pub(crate) fn message(&self) -> &str {
        match *self {
            Self::AuthenticationFailed(ref message) => message,
            Self::SessionInvalid => "Session expired",
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("no data directory is available for this user")]
    NoProjectDirs,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    #[error(r#"no destination matches path "{}""#, .0.escape_default())]
    NotFound(String),
    #[error(r#"no destination is named "{}""#, .0.escape_default())]
    UnknownName(String),
    #[error(r#"destination name "{}" is declared more than once"#, .0.escape_default())]
    DuplicateName(String),
    #[error(r#"destination path "{}" is declared more than once"#, .0.escape_default())]
    DuplicatePath(String),
    #[error(r#"redirect loop while resolving "{}""#, .0.escape_default())]
    RedirectLoop(String),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_message_is_server_detail() {
        assert_eq!(
            Auth::AuthenticationFailed("Bad credentials".to_owned()).message(),
            "Bad credentials",
        );
    }

    #[test]
    fn auth_converts_into_crate_error() {
        let err: Error = Auth::SessionInvalid.into();
        assert!(matches!(err, Error::Auth(Auth::SessionInvalid)));
        assert_eq!(err.to_string(), "session is no longer valid");
    }
}
