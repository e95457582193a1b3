use clap::Parser;
use myskoda_connect::core::{auth, catalog};
use myskoda_connect::utils::{logger, validation::Validate};
use myskoda_connect::{
    CliConfig, Commands, ConnectorConfig, ConnectorError, LocalStorage, SkodaClient,
    SnapshotWriter, VehicleConnector,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn connector(config: &ConnectorConfig) -> myskoda_connect::Result<VehicleConnector<SkodaClient>> {
    config.require_access_token()?;
    let mut client = SkodaClient::from_config(config)?;
    if let Some(tokens) = config.token_set() {
        client = client.with_tokens(tokens);
    }
    Ok(VehicleConnector::new(client).show_extra_keys(config.logging.show_extra_keys))
}

fn print_json(value: &serde_json::Value) -> myskoda_connect::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: &CliConfig, config: &ConnectorConfig) -> myskoda_connect::Result<()> {
    let base = config.api_base();

    match &cli.command {
        Commands::Endpoints { format, check } => {
            let problems = catalog::check();
            if *check {
                if !problems.is_empty() {
                    for problem in &problems {
                        eprintln!("❌ {}", problem);
                    }
                    return Err(ConnectorError::ValidationError {
                        message: format!("{} catalog problem(s)", problems.len()),
                    });
                }
                let totals = catalog::summary();
                println!(
                    "✅ Catalog consistent: {} active + {} disabled",
                    totals.active, totals.disabled
                );
                return Ok(());
            }
            for problem in &problems {
                tracing::warn!("Catalog problem: {}", problem);
            }
            let format = format.unwrap_or(config.output.format);
            print!("{}", catalog::render(format, &base)?);
        }
        Commands::Url { endpoint, vin } => {
            let vin = match vin {
                Some(vin) => Some(vin.clone()),
                None if endpoint.requires_vin() => Some(cli.vin_or_default(None, config)?),
                None => None,
            };
            println!("{} {}", endpoint.spec().method, endpoint.url(&base, vin.as_deref())?);
        }
        Commands::AuthorizeUrl { state } => {
            println!("{}", auth::authorization_url(&config.auth, &base, state)?);
        }
        Commands::Fetch { endpoint, vin } => {
            let vin = if endpoint.requires_vin() {
                Some(cli.vin_or_default(vin.as_deref(), config)?)
            } else {
                None
            };
            let body = connector(config)?.fetch(*endpoint, vin.as_deref()).await?;
            print_json(&body)?;
        }
        Commands::Command {
            endpoint,
            vin,
            body,
        } => {
            let vin = cli.vin_or_default(vin.as_deref(), config)?;
            let body = body
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()?;
            let response = connector(config)?
                .send_command(*endpoint, &vin, body)
                .await?;
            println!("✅ {} accepted (HTTP {})", endpoint, response.status);
            if let Some(body) = &response.body {
                print_json(body)?;
            }
        }
        Commands::Snapshot { vin, .. } => {
            let vin = cli.vin_or_default(vin.as_deref(), config)?;
            let writer = SnapshotWriter::new(LocalStorage::new(config.output.path.clone()));
            let mut snapshot = connector(config)?.snapshot(&vin).await?;
            if let Some(previous) = writer.read_previous(&vin).await? {
                snapshot.merge_previous(&previous);
            }
            let written = writer.write(&snapshot).await?;
            println!(
                "📁 Wrote {} file(s) to {}/{}",
                written.len(),
                config.output.path,
                vin
            );
            for (endpoint, message) in &snapshot.failures {
                println!("⚠️  {}: {}", endpoint, message);
            }
        }
        Commands::Garage => {
            let garage = connector(config)?.garage().await?;
            for vehicle in &garage.vehicles {
                let spec = &vehicle.specification;
                println!(
                    "{}  {}  {}  {}",
                    vehicle.vin,
                    vehicle.name.as_deref().unwrap_or("-"),
                    spec.title.as_deref().or(vehicle.title.as_deref()).unwrap_or("-"),
                    spec.model_year.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}
