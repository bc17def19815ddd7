use anyhow::{Result, anyhow};
use clap::Parser;

use octofhir_seed::cli::RegisterCli;
use octofhir_seed::config::loader::load_config;
use octofhir_seed::output::print_error;
use octofhir_seed::{FhirClient, SearchParameterRegistrar, observability};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }
    observability::init_tracing();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = RegisterCli::parse();
    let mut cfg = load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    cli.apply(&mut cfg);
    cfg.validate().map_err(|e| anyhow!(e))?;
    observability::apply_logging_level(&cfg.logging.level);

    let client = FhirClient::new(&cfg.server);
    let definition = SearchParameterRegistrar::definition_from_settings(&cfg.registrar)?;
    let registrar = SearchParameterRegistrar::new(client, definition, &cfg.registrar)?;
    registrar.register().await?;
    Ok(())
}
