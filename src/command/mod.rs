// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{
    client::Client, credential::Credential, error::Result, password, routes::RouteTable, session,
    storage,
};

pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod navigate;
pub(crate) mod routes;
pub(crate) mod whoami;

/// Everything a command may act on.
pub(crate) struct Context<Storage, PortalClient> {
    pub(crate) session: session::Store<Storage, PortalClient>,
    pub(crate) routes: RouteTable,
    pub(crate) prompt: Box<dyn password::Prompt>,
}

#[async_trait]
pub(crate) trait Command {
    async fn execute<S, C>(self, ctx: &mut Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: Client;
}
