use std::{future::Future, path::Path, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use crudwire::{
    adapters::{AxumTransport, FileConfigProvider, HyperTransport, PostService, PostStore, PostsRouter},
    config::{
        ServerConfigValidator,
        loader::load_config,
        models::{ServerConfig, TransportKind},
    },
    core::Dispatcher,
    ports::{config_provider::ConfigProvider, transport::Transport},
    tracing_setup,
    utils::graceful_shutdown::{GracefulShutdown, ShutdownReason},
};
use tokio::net::TcpListener;

const RELOAD_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "crudwire.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        #[clap(short, long, default_value = "crudwire.toml")]
        config: String,
    },
    /// Write a default configuration file
    Init {
        #[clap(short, long, default_value = "crudwire.toml")]
        config: String,
    },
    /// Start the server (default)
    Serve {
        #[clap(short, long, default_value = "crudwire.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve_command(&config).await,
        None => serve_command(&args.config).await,
    }
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    ServerConfigValidator::validate(&config).context("Invalid configuration")?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    tracing::info!("Loaded configuration from {config_path}");

    let store = Arc::new(if config.seed {
        PostStore::seeded()
    } else {
        PostStore::default()
    });

    let shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    tracing::info!(
        "Starting crudwire on {} (transport: {}, prefix: {})",
        config.listen_addr,
        config.transport,
        config.prefix
    );
    println!(
        "crudwire listening on {} (transport: {}, prefix: {})",
        config.listen_addr, config.transport, config.prefix
    );

    match config.transport {
        TransportKind::Dispatcher => {
            tracing::info!("The dispatcher transport does not reload; restart to apply config changes");
            let app = Dispatcher::new(Arc::new(PostService::new(store)), config.status)
                .with_max_body_bytes(config.max_body_bytes)
                .into_app(&config.prefix);
            let token = shutdown.shutdown_token();
            let server = async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(token.cancelled())
                    .await
                    .context("Server error")
            };
            run_until_shutdown(server, &shutdown).await
        }
        TransportKind::Axum => {
            let transport = AxumTransport::new(config.status)
                .with_max_body_bytes(config.max_body_bytes);
            serve_swappable(Arc::new(transport), config_path, &config, store, listener, &shutdown).await
        }
        TransportKind::Hyper => {
            let transport = HyperTransport::new(config.status)
                .with_max_body_bytes(config.max_body_bytes);
            serve_swappable(Arc::new(transport), config_path, &config, store, listener, &shutdown).await
        }
    }
}

/// Serve a router-backed transport, swapping in a fresh router whenever the
/// config file changes.
async fn serve_swappable<T: Transport>(
    transport: Arc<T>,
    config_path: &str,
    config: &ServerConfig,
    store: Arc<PostStore>,
    listener: TcpListener,
    shutdown: &GracefulShutdown,
) -> Result<()> {
    let router = PostsRouter::new(&config.prefix, store.clone())
        .with_context(|| format!("Invalid prefix {}", config.prefix))?;
    transport.route(Box::new(router));

    let provider =
        FileConfigProvider::new(config_path).context("Failed to create config provider")?;
    if let Some(mut notify_rx) = provider.watch() {
        let transport = transport.clone();
        let mut previous = config.clone();
        tokio::spawn(async move {
            tracing::info!("Config watcher task started.");
            let mut last_reload = tokio::time::Instant::now()
                .checked_sub(RELOAD_DEBOUNCE)
                .unwrap_or_else(tokio::time::Instant::now);

            while notify_rx.recv().await.is_some() {
                if last_reload.elapsed() < RELOAD_DEBOUNCE {
                    tracing::info!("Debouncing config reload event. Still within cooldown period.");
                    while notify_rx.try_recv().is_ok() {}
                    continue;
                }
                last_reload = tokio::time::Instant::now();

                match reload_router(&provider, &previous, &store).await {
                    Ok((router, config)) => {
                        transport.route(Box::new(router));
                        previous = config;
                    }
                    Err(e) => tracing::error!(
                        "Failed to reload configuration: {:#}. Keeping old router.",
                        e
                    ),
                }
                while notify_rx.try_recv().is_ok() {}
            }
            tracing::info!("Config watcher task is shutting down.");
        });
    }

    let server = transport.serve(listener, shutdown.shutdown_token());
    run_until_shutdown(server, shutdown).await
}

async fn reload_router(
    provider: &FileConfigProvider,
    previous: &ServerConfig,
    store: &Arc<PostStore>,
) -> Result<(PostsRouter, ServerConfig)> {
    tracing::info!("Reloading configuration from {}", provider.path().display());
    let config = provider.load_config().await?;
    ServerConfigValidator::validate(&config)?;

    if previous.requires_restart(&config) {
        tracing::warn!("Only the prefix is applied live; other changes take effect on restart");
    }

    let router = PostsRouter::new(&config.prefix, store.clone())?;
    tracing::info!("Routing {} over the existing store", config.prefix);
    Ok((router, config))
}

/// Drive `server` until it stops on its own, or until shutdown is triggered
/// and in-flight requests drain or the drain deadline passes.
async fn run_until_shutdown<F>(server: F, shutdown: &GracefulShutdown) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::pin!(server);
    tokio::select! {
        result = &mut server => return result,
        _ = shutdown.shutdown_token().cancelled() => {}
    }

    let mut outcome = Ok(());
    let reason = shutdown
        .drain(async {
            outcome = (&mut server).await;
        })
        .await;

    match reason {
        ShutdownReason::Graceful => tracing::info!("Graceful shutdown completed"),
        ShutdownReason::Force => tracing::warn!("Shutdown forced with requests still in flight"),
    }
    outcome
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    tracing_setup::init_console_tracing();

    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • Transport: {}", config.transport);
            println!("   • Prefix: {}", config.prefix);
            println!("   • Seed Posts: {}", config.seed);
            println!("   • Max Body Bytes: {}", config.max_body_bytes);
            for (entry, code) in config.status.entries() {
                println!("   • Status {entry}: {code}");
            }
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Verify listen address format (e.g., '127.0.0.1:8080')");
            println!("   • Start the prefix with '/' and drop any trailing '/'");
            println!("   • Keep status codes within 400..=599");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# crudwire configuration

# The address to listen on
listen_addr = "127.0.0.1:8080"

# Dispatch path: "dispatcher" (per-action routes over a service),
# "axum" or "hyper" (catch-all transport over a hot-swappable router)
transport = "dispatcher"

# Route prefix of the example post collection
prefix = "/posts"

# Start with three sample posts
seed = true

# Largest request body accepted, in bytes
max_body_bytes = 1048576

# Status code per error kind. Set bad_method = 403 for the legacy behaviour.
[status]
not_found = 404
internal = 500
bad_method = 405
no_handler = 405
fallback = 400

[logging]
level = "info"
json = false
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'crudwire serve --config {config_path}' to start the server");
    Ok(())
}
