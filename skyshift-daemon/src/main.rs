mod ipc;
mod services;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use skyshift_core::aggregator::Aggregator;
use skyshift_core::apply::{DownloadApplier, MANAGER_STORE_NAME};
use skyshift_core::backend::create_backend;
use skyshift_core::config::Config;
use skyshift_core::download::Downloader;
use skyshift_core::library::{self, OnlineLibrary};
use skyshift_core::paths::SkyshiftPaths;
use skyshift_core::scheduler::{self, AutoRotation};
use skyshift_core::sources::{ApiKeyProvider, SourceRegistry};
use skyshift_core::store::JsonStore;
use skyshift_core::translate::GoogleTranslator;

use services::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyshift_daemon=info,skyshift_core=info".into()),
        )
        .init();

    let paths = SkyshiftPaths::new()?;
    paths.ensure_dirs()?;

    let config = Config::load_or_default(&paths);
    info!(backend = %config.general.backend, "starting skyshift-daemon");

    let client = config.network.build_client()?;

    let library = Arc::new(OnlineLibrary::new(Arc::new(JsonStore::open(
        &paths,
        library::STORE_NAME,
    )?)));
    let keys: Arc<dyn ApiKeyProvider> = library.clone();

    // registration order is the interleave order of merged results
    let mut registry = SourceRegistry::new();
    registry.register(skyshift_source_wallhaven::create_source(client.clone()));
    registry.register(skyshift_source_picsum::create_source(client.clone()));
    registry.register(skyshift_source_unsplash::create_source(client.clone(), keys.clone()));
    registry.register(skyshift_source_pexels::create_source(client.clone(), keys));
    registry.register(skyshift_source_bing::create_source(client.clone()));
    info!(sources = ?registry.names(), "catalogs registered");

    let mut aggregator = Aggregator::new(registry).with_timeout(config.network.timeout());
    if config.search.translate {
        aggregator = aggregator.with_translator(Arc::new(GoogleTranslator::new(client)));
    }
    let aggregator = Arc::new(aggregator);

    let applier = Arc::new(DownloadApplier::new(
        Downloader::new(&config.network)?,
        create_backend(&config),
        Arc::new(JsonStore::open(&paths, MANAGER_STORE_NAME)?),
        paths.wallpapers_dir(),
        config.general.keep_wallpapers,
    ));
    applier.manager().init()?;

    let rotation = Arc::new(AutoRotation::new(
        Arc::new(JsonStore::open(&paths, scheduler::STORE_NAME)?),
        aggregator.clone(),
        applier.clone(),
    ));
    rotation.init()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let services = Arc::new(Services {
        config,
        aggregator,
        library,
        applier,
        rotation: rotation.clone(),
        shutdown: shutdown_tx,
    });

    // spawn IPC server
    let ipc_shutdown = shutdown_rx.clone();
    let ipc_handle = tokio::spawn(ipc::serve_ipc(services.clone(), ipc_shutdown));

    // wait for ctrl+c or a quit request
    let mut quit_rx = shutdown_rx;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("received ctrl+c, shutting down");
            let _ = services.shutdown.send(true);
        }
        _ = quit_rx.changed() => {}
    }

    rotation.stop();
    match ipc_handle.await {
        Ok(Err(e)) => tracing::error!("IPC server error: {e}"),
        Err(e) => tracing::error!("IPC task failed: {e}"),
        Ok(Ok(())) => {}
    }

    // clean up socket
    let socket = SkyshiftPaths::socket_path();
    if socket.exists() {
        let _ = std::fs::remove_file(socket);
    }

    info!("skyshift-daemon stopped");
    Ok(())
}
