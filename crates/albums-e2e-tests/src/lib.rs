pub mod rest;

use std::time::Duration;

use albums_app::state::AppState;
use albums_server::{
    config::{Parser, ServerConfig},
    run::{build_state, run_graceful_with_state},
};
use anyhow::{Result, anyhow};
use rand::Rng as _;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, error};
use url::Url;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

/// Keeps temporary database directory alive
pub struct ConfigGuard {
    data_dir: TempDir,
}

impl ConfigGuard {
    pub fn path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

pub fn test_config(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let db_path = tmp_data_dir.path().join("albums.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
    let port = random_port()?.to_string();
    let args = &[
        "albums-e2e-tests",
        "--database-url",
        &database_url,
        "--port",
        &port,
        "--listen-address",
        "127.0.0.1",
        "--db-max-connections",
        "10",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub fn base_url(args: &ServerConfig) -> Url {
    // safe - address and port are already validated
    Url::parse(&format!("http://{}:{}/", args.listen_address, args.port)).unwrap()
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let (args, config_guard) = test_config(test_name)?;
    debug!("Test {test_name} uses database {}", args.database_url);
    Ok((args, config_guard))
}

/// Stops server when dropped
pub struct ServerGuard {
    shutdown: Option<oneshot::Sender<()>>,
    state: AppState,
}

impl ServerGuard {
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server(args: ServerConfig) -> Result<ServerGuard> {
    let state = build_state(&args).await?;
    spawn_server_with_state(args, state).await
}

pub async fn spawn_server_with_state(args: ServerConfig, state: AppState) -> Result<ServerGuard> {
    let url = base_url(&args).join("health")?;
    let (sender, receiver) = oneshot::channel::<()>();
    let server_state = state.clone();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = receiver.await;
        };
        if let Err(e) = run_graceful_with_state(args, server_state, shutdown).await {
            error!("Server error: {e}");
        }
    });

    wait_for_server(&url).await?;
    Ok(ServerGuard {
        shutdown: Some(sender),
        state,
    })
}

async fn wait_for_server(health_url: &Url) -> Result<()> {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not start"))
}
