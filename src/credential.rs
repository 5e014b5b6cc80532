// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An opaque bearer token issued by the portal.
///
/// The token is never inspected; it is only ever echoed back to the portal in
/// an `Authorization` header.
#[derive(Clone)]
pub(crate) struct Credential(SecretString);

impl Credential {
    /// Wraps a raw token. Empty tokens are not credentials.
    pub(crate) fn new(token: String) -> Option<Self> {
        if token.is_empty() {
            None
        } else {
            Some(Self(SecretString::new(token)))
        }
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::new(String::deserialize(deserializer)?)
            .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(""), &"a non-empty token"))
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{assert_de_tokens_error, assert_tokens, Token};

    use super::*;

    #[test]
    fn empty_token_is_not_a_credential() {
        assert!(Credential::new(String::new()).is_none());
    }

    #[test]
    fn serializes_as_raw_token() {
        let credential = Credential::new("T1".to_owned());
        assert!(credential.is_some());
        if let Some(credential) = credential {
            assert_tokens(&credential, &[Token::Str("T1")]);
        }
    }

    #[test]
    fn rejects_empty_stored_token() {
        assert_de_tokens_error::<Credential>(
            &[Token::Str("")],
            r#"invalid value: string "", expected a non-empty token"#,
        );
    }

    #[test]
    fn debug_does_not_leak_token() {
        let credential = Credential::new("secret-token".to_owned());
        assert_eq!(format!("{credential:?}"), "Some(Credential([REDACTED]))");
    }
}
