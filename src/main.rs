mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use ba_core::config::Config;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "banneradmin=debug,ba_server=debug,ba_images=debug,ba_db=debug,ba_core=debug,tower_http=debug".to_string()
        } else {
            "banneradmin=info,ba_server=info,ba_images=info,ba_db=info,ba_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ba_server::start(config))?;
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("banneradmin {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::GenerateApiKey => {
            println!("{}", ba_server::middleware::auth::generate_api_key());
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Auth enabled: {}", config.auth.enabled);
    println!(
        "  Uploads: {} (served at /{})",
        config.uploads.dir.display(),
        config.uploads.public_base.trim_matches('/')
    );
    for warning in config.validate() {
        println!("  warning: {warning}");
    }

    Ok(())
}
