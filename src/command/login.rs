// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::num;

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};

use crate::{
    client::Client,
    credential::Credential,
    error::{self, Result},
    password::{self, Prompt as _},
    storage,
};

use super::Context;

/// Sign in to the portal and save the credential it issues.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The number of times to ask for the password before giving up. Only
    /// interactive prompts ask more than once.
    #[arg(long, default_value = "3")]
    attempts: num::NonZeroUsize,

    /// The account to sign in as.
    #[clap()]
    username: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client,
    {
        let attempts = if ctx.prompt.is_interactive() {
            self.attempts.get()
        } else {
            1
        };

        let mut last_error: Option<error::Auth> = None;
        for _ in 0..attempts {
            let mut req = password::RequestBuilder::new(&self.username);
            if let Some(ref e) = last_error {
                req = req.with_error(e.message());
            }

            let Some(password) = ctx.prompt.prompt(req.into_request()).await? else {
                error!("No password was provided");
                return Err(error::Password::NoPrompt.into());
            };

            match ctx.session.login(&self.username, &password).await {
                Ok(()) => {
                    report(ctx, &self.username);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(error::Auth::SessionInvalid).into())
    }
}

fn report<S, C>(ctx: &Context<S, C>, username: &str)
where
    S: storage::Storage<Credential>,
    C: Client,
{
    match ctx.session.identity() {
        Some(identity) if ctx.session.is_privileged() => {
            println!(
                "Signed in as {} ({})",
                identity.username,
                ctx.session.privileged_role()
            );
        }
        Some(identity) => println!("Signed in as {}", identity.username),
        None => {
            warn!("Signed in, but the portal did not return a profile");
            println!("Signed in as {username}");
        }
    }

    if !ctx.session.is_persistent() {
        warn!("The credential is only kept for this run");
    }
}
