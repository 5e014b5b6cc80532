// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{client::Client, credential::Credential, error::Result, storage};

use super::Context;

/// Sign out and forget the saved credential.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client,
    {
        ctx.session.logout().await;
        println!("Signed out");
        Ok(())
    }
}
