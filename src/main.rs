// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod client;
mod command;
mod credential;
mod error;
mod guard;
mod identity;
mod metadata;
mod password;
mod routes;
mod session;
mod storage;

use std::{fs, path::PathBuf, process, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use command::Command as _;
use credential::Credential;
use error::Result;
use log::{error, warn};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    Navigate(command::navigate::Command),
    Routes(command::routes::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute<S, C>(self, ctx: &mut command::Context<S, C>) -> Result<()>
    where
        S: storage::Storage<Credential>,
        C: client::Client,
    {
        match self {
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
            Self::Whoami(cmd) => cmd.execute(ctx).await,
            Self::Navigate(cmd) => cmd.execute(ctx).await,
            Self::Routes(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the portal.
    #[arg(long, env = "PORTAL_URL", default_value = "http://127.0.0.1:8000", value_parser = Url::parse)]
    url: Url,

    /// The path of the endpoint that exchanges a user name and password for a
    /// token.
    #[arg(long, env = "PORTAL_TOKEN_PATH", default_value = "/token")]
    token_path: String,

    /// The path of the endpoint that returns the signed-in user's profile.
    #[arg(long, env = "PORTAL_IDENTITY_PATH", default_value = "/users/me")]
    identity_path: String,

    /// The role that grants access to administrative destinations.
    #[arg(long, env = "PORTAL_PRIVILEGED_ROLE", default_value = "admin")]
    privileged_role: String,

    /// How many seconds to wait for the portal to answer a request.
    #[arg(long, env = "PORTAL_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// A JSON file describing the portal's destinations. The built-in table
    /// is used when this is not given.
    #[arg(long, env = "PORTAL_ROUTES", value_hint = clap::ValueHint::FilePath)]
    routes: Option<PathBuf>,

    /// Keep the credential only for the duration of this command.
    #[arg(long)]
    no_persist_credential: bool,

    /// Read the password from standard input instead of prompting for it.
    #[arg(long)]
    password_stdin: bool,

    /// The path to the Pinentry program to use when asking for the password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn get_credential_storage(args: &Args) -> Box<dyn storage::Storage<Credential>> {
    if !args.no_persist_credential {
        let key = storage::Key::new(&args.url, metadata::CREDENTIAL_SLOT);

        #[cfg(feature = "secret-service")]
        match storage::SecretService::new(key.clone()).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::new(&key) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to Keychain: {}", e);
            }
        }

        if let Some(file_storage) = storage::File::new(&key) {
            return Box::new(file_storage);
        }
        warn!("No data directory is available, so the credential will not be saved");
    }

    Box::new(storage::Memory::<Credential>::new())
}

fn get_prompt(args: &Args) -> Box<dyn password::Prompt> {
    if args.password_stdin {
        return Box::new(password::StdinPrompt);
    }

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];
    Box::new(prompt)
}

fn get_routes(args: &Args) -> Result<routes::RouteTable> {
    match args.routes {
        Some(ref path) => routes::RouteTable::from_reader(fs::File::open(path)?),
        None => Ok(routes::RouteTable::portal()?),
    }
}

async fn run(args: Args) -> Result<()> {
    let client = client::Http::new(
        &args.url,
        &args.token_path,
        &args.identity_path,
        Duration::from_secs(args.timeout),
    )?;
    let session = session::Store::restore(
        get_credential_storage(&args).await,
        client,
        args.privileged_role.as_str(),
    )
    .await;

    let mut ctx = command::Context {
        session,
        routes: get_routes(&args)?,
        prompt: get_prompt(&args),
    };
    command::Command::execute(args.command, &mut ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("PORTAL_LOG", "warn")
        .write_style("PORTAL_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
