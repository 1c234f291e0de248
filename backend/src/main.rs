//! Backend entry-point: one subcommand per service process.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use std::ffi::OsString;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use adoption_backend::server::{self, ServiceRole, ServiceSettings};

/// Pet adoption backend services.
#[derive(Debug, Parser)]
#[command(name = "adoption-backend", version, about)]
struct Cli {
    /// Service this process hosts.
    #[command(subcommand)]
    role: ServiceRole,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    // Settings come from the environment and config files; the CLI only names the role.
    let settings = ServiceSettings::load_from_iter([OsString::from("adoption-backend")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    server::run(cli.role, settings)
        .await
        .wrap_err_with(|| format!("{} service failed", cli.role.name()))
}
