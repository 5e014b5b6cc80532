// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer};

/// The profile the portal returns for the holder of a credential.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(try_from = "Profile")]
pub(crate) struct Identity {
    pub(crate) username: String,
    pub(crate) roles: Vec<String>,
    /// Any other profile fields, kept as the portal sent them.
    pub(crate) profile: serde_json::Map<String, serde_json::Value>,
}

// Token-style profiles name the user `sub`. When both names are present the
// explicit `username` wins.
#[derive(Deserialize)]
struct Profile {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default, deserialize_with = "deserialize_roles")]
    roles: Vec<String>,
    #[serde(flatten)]
    profile: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<Profile> for Identity {
    type Error = &'static str;

    fn try_from(value: Profile) -> Result<Self, Self::Error> {
        Ok(Self {
            username: value
                .username
                .or(value.sub)
                .ok_or("missing field `username`")?,
            roles: value.roles,
            profile: value.profile,
        })
    }
}

impl Identity {
    pub(crate) fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|candidate| candidate == role)
    }
}

// Some portal deployments send roles as a comma-separated string rather than
// a list.
fn deserialize_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<String>),
        Joined(String),
    }

    let roles = match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::List(roles)) => roles,
        Some(Repr::Joined(joined)) => joined.split(',').map(str::to_owned).collect(),
        None => vec![],
    };

    Ok(roles
        .into_iter()
        .map(|role| role.trim().to_owned())
        .filter(|role| !role.is_empty())
        .collect())
}
