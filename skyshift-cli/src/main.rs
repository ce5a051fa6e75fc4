use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use skyshift_core::ipc::{self, IpcRequest, IpcResponse};
use skyshift_core::models::{
    AutoChangeConfig, IntervalUnit, ResolutionTier, SearchOptions, Source, WallpaperItem,
};

#[derive(Parser)]
#[command(name = "skyshift", about = "Online wallpaper rotation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show auto-rotation status
    Status,
    /// Pick and apply a new wallpaper now
    Next,
    /// Turn auto-rotation on
    Enable,
    /// Turn auto-rotation off
    Disable,
    /// Show or change the auto-rotation settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Search every catalog
    Search {
        /// Keywords; omit to browse
        query: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Bing, Wallhaven and Picsum mixed feed
    Popular,
    /// Wallpapers ranked for a screen size
    ForResolution {
        /// Defaults to the configured display size
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Wallpapers for a named category
    Category {
        name: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// List the predefined categories
    Categories,
    /// List the standard resolutions
    Resolutions,
    /// Query a single catalog
    Query {
        /// unsplash, pexels, picsum, bing or wallhaven
        source: Source,
        query: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Download an image without applying it
    Download {
        url: String,
        /// Target directory, the wallpapers directory by default
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Download an image and set it as wallpaper
    Apply { url: String },
    /// Delete old downloads beyond the configured limit
    Prune,
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Manage browsing history
    History {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Manage provider API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Manage the local wallpapers directory
    Local {
        #[command(subcommand)]
        action: LocalAction,
    },
    /// Cycle through local wallpapers on a timer
    Slideshow {
        #[command(subcommand)]
        action: SlideshowAction,
    },
    /// Stop the daemon
    Quit,
}

#[derive(Args)]
struct Paging {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Get,
    /// Update settings; unset flags keep their current value
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        every: Option<u64>,
        /// minutes, hours or days
        #[arg(long)]
        unit: Option<IntervalUnit>,
        /// 1080p, 2k, 4k or auto
        #[arg(long)]
        resolution: Option<ResolutionTier>,
        /// Comma separated category names; pass an empty string to clear
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// List stored items
    List,
    /// Add an item given as its JSON document
    Add { item: String },
    /// Remove an item by id (favorites only)
    Remove { id: String },
    /// Remove every item (history only)
    Clear,
    /// Tell whether an id is stored (favorites only)
    Check { id: String },
}

#[derive(Subcommand)]
enum LocalAction {
    /// List images in the wallpapers directory
    List,
    /// Set a local image as wallpaper
    Set { path: PathBuf },
    /// Copy an image into the wallpapers directory
    Add { path: PathBuf },
    /// Delete an image from the wallpapers directory, by name or path
    Remove { path: PathBuf },
    /// Delete every image in the wallpapers directory
    Clear,
    /// Show the next image in the directory
    Next,
    /// Print the wallpaper currently on screen
    Current,
}

#[derive(Subcommand)]
enum SlideshowAction {
    /// Start the slideshow
    Start {
        /// Minutes between changes, at least one
        #[arg(long)]
        every: Option<u64>,
    },
    /// Stop the slideshow
    Stop,
    /// Show slideshow state
    Status,
}

#[derive(Subcommand)]
enum KeysAction {
    /// Show which keys are configured
    Status,
    /// Store a key; an empty key removes it
    Set { source: Source, key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let request = match cli.command {
        Commands::Config {
            action:
                ConfigAction::Set {
                    enabled,
                    every,
                    unit,
                    resolution,
                    categories,
                },
        } => {
            let mut config = current_config().await?;
            if let Some(enabled) = enabled {
                config.enabled = enabled;
            }
            if let Some(every) = every {
                config.interval_value = every;
            }
            if let Some(unit) = unit {
                config.interval_unit = unit;
            }
            if let Some(resolution) = resolution {
                config.resolution = resolution;
            }
            if let Some(categories) = categories {
                config.categories = categories
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
            }
            IpcRequest::SaveConfig { config }
        }
        command => to_request(command)?,
    };

    print_response(send(request).await?);
    Ok(())
}

/// Map a parsed command onto its daemon request.
fn to_request(command: Commands) -> Result<IpcRequest> {
    let request = match command {
        Commands::Status => IpcRequest::Status,
        Commands::Next => IpcRequest::ChangeNow,
        Commands::Enable => IpcRequest::Enable,
        Commands::Disable => IpcRequest::Disable,
        Commands::Config { action } => match action {
            ConfigAction::Get => IpcRequest::GetConfig,
            ConfigAction::Set { .. } => anyhow::bail!("config set needs the current config"),
        },
        Commands::Search { query, paging } => IpcRequest::Search {
            options: paging.options(query),
        },
        Commands::Popular => IpcRequest::Popular,
        Commands::ForResolution {
            width,
            height,
            page,
        } => IpcRequest::ForResolution {
            width,
            height,
            options: SearchOptions {
                page,
                ..Default::default()
            },
        },
        Commands::Category { name, page } => IpcRequest::Category { name, page },
        Commands::Categories => IpcRequest::Categories,
        Commands::Resolutions => IpcRequest::Resolutions,
        Commands::Query {
            source,
            query,
            paging,
        } => IpcRequest::Query {
            source,
            options: paging.options(query),
        },
        Commands::Download { url, dir } => IpcRequest::Download { url, dir },
        Commands::Apply { url } => IpcRequest::ApplyUrl { url },
        Commands::Prune => IpcRequest::Prune,
        Commands::Favorites { action } => match action {
            ItemAction::List => IpcRequest::FavoritesList,
            ItemAction::Add { item } => IpcRequest::FavoritesAdd {
                item: parse_item(&item)?,
            },
            ItemAction::Remove { id } => IpcRequest::FavoritesRemove { id },
            ItemAction::Check { id } => IpcRequest::FavoritesCheck { id },
            ItemAction::Clear => anyhow::bail!("favorites are removed one at a time"),
        },
        Commands::History { action } => match action {
            ItemAction::List => IpcRequest::HistoryList,
            ItemAction::Add { item } => IpcRequest::HistoryAdd {
                item: parse_item(&item)?,
            },
            ItemAction::Clear => IpcRequest::HistoryClear,
            ItemAction::Remove { .. } => anyhow::bail!("history entries cannot be removed singly"),
            ItemAction::Check { .. } => anyhow::bail!("only favorites can be checked"),
        },
        Commands::Keys { action } => match action {
            KeysAction::Status => IpcRequest::HasApiKeys,
            KeysAction::Set { source, key } => IpcRequest::SetApiKey { source, key },
        },
        Commands::Local { action } => match action {
            LocalAction::List => IpcRequest::LocalList,
            LocalAction::Set { path } => IpcRequest::LocalSet {
                path: std::path::absolute(path)?,
            },
            LocalAction::Add { path } => IpcRequest::LocalAdd {
                path: std::path::absolute(path)?,
            },
            LocalAction::Remove { path } => IpcRequest::LocalRemove {
                path: library_path(path)?,
            },
            LocalAction::Clear => IpcRequest::LocalRemoveAll,
            LocalAction::Next => IpcRequest::LocalNext,
            LocalAction::Current => IpcRequest::CurrentWallpaper,
        },
        Commands::Slideshow { action } => match action {
            SlideshowAction::Start { every } => IpcRequest::SlideshowStart {
                interval: every.map(|minutes| minutes.saturating_mul(60_000)),
            },
            SlideshowAction::Stop => IpcRequest::SlideshowStop,
            SlideshowAction::Status => IpcRequest::SlideshowStatus,
        },
        Commands::Quit => IpcRequest::Quit,
    };
    Ok(request)
}

/// Bare file names stay relative so the daemon looks them up in its
/// wallpapers directory; anything else is made absolute here.
fn library_path(path: PathBuf) -> Result<PathBuf> {
    if path.components().count() == 1 && path.is_relative() {
        Ok(path)
    } else {
        Ok(std::path::absolute(path)?)
    }
}

impl Paging {
    fn options(self, query: Option<String>) -> SearchOptions {
        SearchOptions {
            query,
            page: self.page,
            per_page: self.per_page,
            ..Default::default()
        }
    }
}

fn parse_item(json: &str) -> Result<WallpaperItem> {
    serde_json::from_str(json).map_err(|e| anyhow::anyhow!("invalid wallpaper item: {e}"))
}

async fn current_config() -> Result<AutoChangeConfig> {
    match send(IpcRequest::GetConfig).await? {
        IpcResponse::Ok { data: Some(data) } => Ok(serde_json::from_value(data)?),
        IpcResponse::Ok { data: None } => Ok(AutoChangeConfig::default()),
        IpcResponse::Error { message } => anyhow::bail!(message),
    }
}

async fn send(request: IpcRequest) -> Result<IpcResponse> {
    ipc::send_request(&request)
        .await
        .map_err(|e| anyhow::anyhow!("daemon not running. start with: skyshift-daemon\n  ({e})"))
}

fn print_response(resp: IpcResponse) {
    match resp {
        IpcResponse::Ok { data: Some(data) } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&data).unwrap_or_default()
            );
        }
        IpcResponse::Ok { data: None } => {
            println!("ok");
        }
        IpcResponse::Error { message } => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    }
}
