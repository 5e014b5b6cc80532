// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    client::Client,
    credential::Credential,
    error::{self, Result},
    identity::Identity,
    storage,
};

use super::Context;

/// Show the profile the portal reports for the signed-in user.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[derive(Clone, Debug, PartialEq, Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl Field {
    fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn fields(identity: &Identity, privileged: bool) -> Vec<Field> {
    let mut fields = vec![
        Field::new("User", identity.username.as_str()),
        Field::new("Roles", identity.roles.join(", ")),
        Field::new("Privileged", if privileged { "yes" } else { "no" }),
    ];
    fields.extend(identity.profile.iter().map(|(name, value)| {
        let value = match *value {
            serde_json::Value::String(ref s) => s.clone(),
            ref other => other.to_string(),
        };
        Field::new(name.as_str(), value)
    }));
    fields
}

#[async_trait]
impl super::Command for Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client,
    {
        if !ctx.session.is_authenticated() {
            error!("You are not signed in");
            return Err(error::Error::Command);
        }

        ctx.session.fetch_identity().await?;
        let identity = ctx.session.identity().ok_or(error::Auth::SessionInvalid)?;

        println!(
            "{}",
            Table::new(fields(identity, ctx.session.is_privileged())).with(Style::rounded())
        );
        Ok(())
    }
}
