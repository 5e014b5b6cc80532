// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use async_trait::async_trait;
use clap::Parser;

use crate::{
    client::Client,
    credential::Credential,
    error::{self, Result},
    guard::{self, Decision},
    routes::Destination,
    storage,
};

use super::Context;

// A table whose redirect targets refuse the session too never settles.
const MAX_HOPS: usize = 8;

/// Check whether the current session may visit a path.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Evaluate each redirect target in turn until a destination admits the
    /// session, as a browser following the portal's redirects would.
    #[arg(long)]
    follow: bool,

    /// The path to visit, such as /admin/users.
    #[clap()]
    path: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    destination: Destination,
    outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Outcome {
    Allowed,
    Redirected(Destination),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Allowed => write!(
                f,
                "allow {} ({})",
                self.destination.label(),
                self.destination.path
            ),
            Outcome::Redirected(ref target) => write!(
                f,
                "redirect {} ({}) -> {} ({})",
                self.destination.label(),
                self.destination.path,
                target.label(),
                target.path
            ),
        }
    }
}

async fn walk<S, C>(ctx: &mut Context<S, C>, path: &str, follow: bool) -> Result<Vec<Step>>
where
    S: storage::Storage<Credential>,
    C: Client,
{
    let mut steps = vec![];
    let mut destination = ctx.routes.resolve(path)?.clone();
    for _ in 0..MAX_HOPS {
        let decision = guard::admit(&mut ctx.session, destination.requirements).await;
        let outcome = match decision {
            Decision::Allow => Outcome::Allowed,
            Decision::RedirectTo(redirect) => {
                Outcome::Redirected(ctx.routes.redirect_target(redirect)?.clone())
            }
        };

        let next = match outcome {
            Outcome::Redirected(ref target) if follow => Some(target.clone()),
            Outcome::Allowed | Outcome::Redirected(_) => None,
        };
        steps.push(Step {
            destination,
            outcome,
        });

        match next {
            Some(target) => destination = target,
            None => return Ok(steps),
        }
    }
    Err(error::Route::RedirectLoop(path.to_owned()).into())
}

#[async_trait]
impl super::Command for Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client,
    {
        for step in walk(ctx, &self.path, self.follow).await? {
            println!("{step}");
        }
        Ok(())
    }
}
