use clap::Parser;
use rate_feed::cli::{Cli, Commands};
use rate_feed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: config file {} not found", cli.config);
        eprintln!("Using default configuration");
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    };

    // Initialize telemetry
    let _telemetry = rate_feed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            config.validate()?;
            tracing::info!("Starting rate feed");
            args.execute(&config).await?;
        }
        Commands::Normalize(args) => {
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("{:#?}", config);
        }
    }

    Ok(())
}
