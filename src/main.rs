// src/main.rs
use anyhow::{Context, Result};
use rust_healthcheck::cli::{self, Command, ServeArgs};
use rust_healthcheck::config::{self, Config};
use rust_healthcheck::plugins::default_kernel;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {}\n\n{}", err, cli::usage());
            std::process::exit(cli::EXIT_ERROR);
        }
    };

    match command {
        Command::Help => {
            println!("{}", cli::usage());
            Ok(())
        }
        Command::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check { url } => {
            init_tracing(true)?;
            let code = match cli::check_remote(&url).await {
                Ok(status) => {
                    println!("{}", status);
                    cli::exit_code_for(status)
                }
                Err(err) => {
                    eprintln!("error: {:#}", err);
                    cli::EXIT_ERROR
                }
            };
            std::process::exit(code);
        }
        Command::Serve(args) => {
            init_tracing(args.quiet)?;
            serve(args).await
        }
    }
}

fn init_tracing(quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::from_default_env().add_directive("warn".parse()?)
    } else {
        EnvFilter::from_default_env()
            .add_directive("rust_healthcheck=debug".parse()?)
            .add_directive("hyper=info".parse()?)
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            config::load_config(path).await?
        }
        None => Config::default(),
    };

    let options = args.into_options(config);
    options
        .config
        .validate()
        .context("Invalid configuration after applying command line options")?;

    let mut kernel = default_kernel(options)?;
    if let Err(err) = kernel.init().await {
        error!("Failed to start: {:#}", anyhow::Error::new(err));
        let report = kernel.destroy().await;
        for failure in &report.failures {
            warn!(plugin = %failure.plugin, "cleanup failed: {}", failure.error);
        }
        std::process::exit(1);
    }

    shutdown_signal().await;

    let report = kernel.destroy().await;
    if !report.is_clean() {
        for failure in &report.failures {
            warn!(plugin = %failure.plugin, "teardown failed: {}", failure.error);
        }
    }
    info!("Shutdown complete");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
