use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use shutterfolio::{
    Config,
    catalog::{CatalogResponse, CatalogScanner},
    create_app,
    engine::{
        DirectoryCatalogLoader, DynCatalogLoader, FavoritesStore, Gallery, HttpCatalogLoader,
        SortOrder, ViewMode,
    },
    layout, startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Print the image listing for a directory as JSON
    Catalog {
        /// Directory to list (defaults to the configured source directory)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Load the catalog through the gallery engine and print what it would show
    Browse {
        /// Catalog endpoint URL or image directory
        #[arg(short, long)]
        source: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// newest, oldest or featured
        #[arg(long)]
        sort: Option<SortOrder>,

        /// grid, masonry, collage or carousel
        #[arg(long)]
        view: Option<ViewMode>,

        #[arg(long)]
        shuffle: bool,

        /// Seed for reproducible shuffles
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage stored favorites
    #[command(subcommand)]
    Favorites(FavoritesCommands),
}

#[derive(Subcommand, Debug)]
enum FavoritesCommands {
    /// List favorite ids, oldest first
    List,
    /// Add an image id
    Add { id: u32 },
    /// Remove an image id
    Remove { id: u32 },
    /// Flip an image id in or out of the favorites
    Toggle { id: u32 },
    /// Remove every favorite
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        Some(Commands::Catalog { source }) => print_catalog(config, source).await,
        Some(Commands::Browse {
            source,
            category,
            sort,
            view,
            shuffle,
            seed,
        }) => {
            let options = BrowseOptions {
                source,
                category,
                sort,
                view,
                shuffle,
                seed,
            };
            browse(config, options).await
        }
        Some(Commands::Favorites(cmd)) => handle_favorites_command(&config, cmd),
        None => {
            // Default to serve command if no subcommand specified
            run_server(config, None, None, None).await
        }
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        let config = toml_edit::de::from_str::<Config>(&config_content)?;
        info!("Configuration loaded from: {:?}", config_path);
        Ok(config)
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

async fn print_catalog(
    mut config: Config,
    source: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(source) = source {
        config.catalog.source_directory = source;
    }

    let scanner = CatalogScanner::new(config.catalog);
    let images = scanner.list_images().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&CatalogResponse { images })?
    );
    Ok(())
}

struct BrowseOptions {
    source: Option<String>,
    category: Option<String>,
    sort: Option<SortOrder>,
    view: Option<ViewMode>,
    shuffle: bool,
    seed: Option<u64>,
}

async fn browse(config: Config, options: BrowseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let source = options
        .source
        .unwrap_or_else(|| config.gallery.catalog_endpoint.clone());

    let loader: DynCatalogLoader = if source.starts_with("http://") || source.starts_with("https://")
    {
        Arc::new(HttpCatalogLoader::new(source)?)
    } else {
        let mut catalog_config = config.catalog.clone();
        catalog_config.source_directory = PathBuf::from(source);
        Arc::new(DirectoryCatalogLoader::new(Arc::new(CatalogScanner::new(
            catalog_config,
        ))))
    };
    info!("Browsing via {}", loader.name());

    let favorites = FavoritesStore::from_config(&config.favorites);
    let settings = config.gallery.clone();
    let gallery = match options.seed {
        Some(seed) => Gallery::with_rng(loader, favorites, settings, StdRng::seed_from_u64(seed)),
        None => Gallery::new(loader, favorites, settings),
    };

    gallery.activate().await?;

    if let Some(sort) = options.sort {
        gallery.set_sort(sort);
    }
    if options.category.is_some() {
        gallery.set_category(options.category);
    }
    if let Some(view) = options.view {
        gallery.set_view_mode(view);
    }
    if options.shuffle {
        gallery.shuffle();
    }

    let images = gallery.images();
    let category = gallery.category();
    println!(
        "{} images, {} view, {} order, category {}",
        images.len(),
        gallery.view_mode(),
        gallery.sort(),
        category.as_deref().unwrap_or("all")
    );

    for image in &images {
        let (width, height) = layout::layout_box(image);
        let marker = if gallery.is_favorite(image.id) { '*' } else { ' ' };
        println!(
            "{} {:>4}  {:<14} {:>6}  {}",
            marker,
            image.id,
            image.category.as_deref().unwrap_or("-"),
            layout::ratio_label(width, height),
            image.url
        );
    }

    let categories = gallery.categories();
    if !categories.is_empty() {
        println!("Categories: {}", categories.join(", "));
    }

    Ok(())
}

fn handle_favorites_command(
    config: &Config,
    cmd: FavoritesCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FavoritesStore::from_config(&config.favorites);

    match cmd {
        FavoritesCommands::List => {
            if store.is_empty() {
                println!("No favorites stored");
            } else {
                println!("Favorites ({} of max {}):", store.len(), store.max_entries());
                for id in store.ids() {
                    println!("  {}", id);
                }
            }
        }
        FavoritesCommands::Add { id } => {
            store.add(id);
            println!("Added {} to favorites", id);
        }
        FavoritesCommands::Remove { id } => {
            store.remove(id);
            println!("Removed {} from favorites", id);
        }
        FavoritesCommands::Toggle { id } => {
            if store.toggle(id) {
                println!("{} is now a favorite", id);
            } else {
                println!("{} is no longer a favorite", id);
            }
        }
        FavoritesCommands::Clear => {
            store.clear();
            println!("Cleared all favorites");
        }
    }

    if !store.is_persistent() {
        return Err(format!(
            "favorites could not be saved under {:?}",
            config.favorites.directory
        )
        .into());
    }

    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!(
        "Portfolio source directory: {:?}",
        config.catalog.source_directory
    );
    info!("Images served under: {}", config.catalog.url_prefix);

    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let app = create_app(config).await;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
