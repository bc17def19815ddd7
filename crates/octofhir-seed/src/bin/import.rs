use anyhow::{Result, anyhow};
use clap::Parser;

use octofhir_seed::cli::ImportCli;
use octofhir_seed::config::loader::load_config;
use octofhir_seed::output::{print_error, print_summary};
use octofhir_seed::{FhirClient, Importer, SeedCatalog, SeedError, observability};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }
    observability::init_tracing();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&format!("{e:#}"));
            if let Some(seed_err) = e.downcast_ref::<SeedError>()
                && seed_err.is_connectivity()
            {
                eprintln!("\nPlease ensure the FHIR server is running (docker-compose up)");
            }
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = ImportCli::parse();
    let mut cfg = load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    cli.apply(&mut cfg);
    cfg.validate().map_err(|e| anyhow!(e))?;
    observability::apply_logging_level(&cfg.logging.level);

    let client = FhirClient::new(&cfg.server);
    let catalog = SeedCatalog::from_settings(&cfg.import)?;
    let mut importer = Importer::new(client, cfg.import, catalog);

    let summary = importer.run().await?;
    print_summary(&summary);
    Ok(summary.exit_code())
}
