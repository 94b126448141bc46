//! `user-admin` entry-point: a command-line presentation adapter over the
//! user client core.
//!
//! Results are written to stdout as JSON; logs go to stderr.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use serde::Serialize;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use client::config::ClientSettings;
use client::domain::{FormController, RecordCache, SubmitError, UserFields, UserId};
use client::outbound::http::HttpUserGateway;

/// `user-admin` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "user-admin",
    about = "List, create, edit, and delete users on a REST user backend",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the user field descriptors.
    Fields,
    /// Print every user in backend order.
    List,
    /// Print one user.
    Show {
        /// Identifier of the user.
        id: UserId,
    },
    /// Validate and create a user.
    Create {
        /// Field value as `name=value`; repeat for each field.
        #[arg(short = 'f', long = "field", value_name = "name=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Load a user, apply field overrides, and save it.
    Update {
        /// Identifier of the user.
        id: UserId,
        /// Field override as `name=value`; repeat for each field.
        #[arg(short = 'f', long = "field", value_name = "name=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Delete a user and print the refreshed list.
    Delete {
        /// Identifier of the user.
        id: UserId,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = load_settings()?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(args.command, &settings))
}

fn load_settings() -> Result<ClientSettings> {
    ClientSettings::load_from_iter([OsString::from("user-admin")])
        .map_err(|error| eyre!("failed to load settings: {error}"))
}

async fn run(command: Command, settings: &ClientSettings) -> Result<()> {
    match command {
        Command::Fields => print_json(UserFields::FIELDS),
        Command::List => {
            let cache = connect(settings)?;
            cache.refresh().await?;
            print_json(&*cache.users())
        }
        Command::Show { id } => {
            let cache = connect(settings)?;
            let user = cache.fetch_user(id).await?;
            print_json(&user)
        }
        Command::Create { fields } => {
            let cache = connect(settings)?;
            let mut form = FormController::new();
            apply_fields(&mut form, fields)?;
            submit(&mut form, &cache).await
        }
        Command::Update { id, fields } => {
            let cache = connect(settings)?;
            let user = cache.fetch_user(id).await?;
            let mut form = FormController::new();
            form.start_edit(&user);
            apply_fields(&mut form, fields)?;
            submit(&mut form, &cache).await
        }
        Command::Delete { id } => {
            let cache = connect(settings)?;
            cache.delete(id).await?;
            print_json(&*cache.users())
        }
    }
}

fn connect(settings: &ClientSettings) -> Result<RecordCache> {
    let base_url = settings.api_url()?;
    let gateway = HttpUserGateway::new(&base_url, settings.request_timeout())
        .wrap_err("failed to build user gateway")?;
    Ok(RecordCache::new(
        Arc::new(gateway),
        Arc::new(DefaultClock),
        settings.cache_config(),
    ))
}

fn apply_fields(form: &mut FormController, fields: Vec<(String, String)>) -> Result<()> {
    for (name, value) in fields {
        form.set_field(&name, value)?;
    }
    Ok(())
}

async fn submit(form: &mut FormController, cache: &RecordCache) -> Result<()> {
    match form.submit(cache).await {
        Ok(outcome) => print_json(&outcome),
        Err(SubmitError::Invalid(errors)) => {
            print_json(&errors)?;
            Err(eyre!("{errors}"))
        }
        Err(error) => Err(error.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).wrap_err("failed to encode output")?;
    writeln!(stdout).wrap_err("failed to write output")?;
    Ok(())
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    let key = name.trim();
    if key.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
