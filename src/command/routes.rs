// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table, Tabled};

use crate::{client::Client, credential::Credential, error::Result, routes::Destination, storage};

use super::Context;

/// List the portal's destinations and who may visit them.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[derive(Tabled)]
struct Row<'dest> {
    #[tabled(rename = "Name")]
    name: &'dest str,
    #[tabled(rename = "Path")]
    path: &'dest str,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Redirects To")]
    redirect: &'dest str,
}

impl<'dest> From<&'dest Destination> for Row<'dest> {
    fn from(dest: &'dest Destination) -> Self {
        Self {
            name: dest.name.as_deref().unwrap_or_default(),
            path: &dest.path,
            access: dest.requirements.to_string(),
            redirect: dest.redirect.as_deref().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client,
    {
        println!(
            "{}",
            Table::new(ctx.routes.destinations().map(Row::from)).with(Style::rounded())
        );
        Ok(())
    }
}
