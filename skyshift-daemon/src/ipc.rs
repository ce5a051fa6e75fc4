use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use skyshift_core::ipc::{IpcRequest, IpcResponse};
use skyshift_core::paths::SkyshiftPaths;

use crate::services::Services;

pub async fn serve_ipc(
    services: Arc<Services>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let socket_path = SkyshiftPaths::socket_path();

    // clean up stale socket
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }

    let listener = UnixListener::bind(&socket_path)?;
    info!(path = %socket_path.display(), "IPC socket listening");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let services = services.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, services).await {
                                warn!("IPC connection error: {e}");
                            }
                        });
                    }
                    Err(e) => warn!("IPC accept error: {e}"),
                }
            }
            _ = shutdown.changed() => {
                info!("IPC server shutting down");
                let _ = std::fs::remove_file(&socket_path);
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    services: Arc<Services>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();
    buf_reader.read_line(&mut line).await?;

    let (response, quit) = match serde_json::from_str::<IpcRequest>(line.trim()) {
        Ok(request) => {
            let quit = matches!(request, IpcRequest::Quit);
            (services.dispatch(request).await, quit)
        }
        Err(e) => (IpcResponse::error(format!("invalid request: {e}")), false),
    };

    let mut resp_line = serde_json::to_string(&response)?;
    resp_line.push('\n');
    writer.write_all(resp_line.as_bytes()).await?;
    writer.shutdown().await?;

    // answer first so the client is not cut off by the teardown
    if quit {
        debug!("quit requested over ipc");
        services.request_shutdown();
    }
    Ok(())
}
