//! Process startup: store selection, socket bind and graceful shutdown.

use std::sync::Arc;

use axum::{extract::Request, ServiceExt};
use log::{error, info};
use popsicle_core::db::{open_db, DbError};
use popsicle_core::{InMemoryPopsicleRepository, RepoError, SharedRepository, SharedSqliteRepository};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};

use crate::config::{ServerConfig, StoreConfig};
use crate::router;
use crate::state::ApiState;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to open inventory database: {0}")]
    Db(#[from] DbError),

    #[error("inventory database is not usable: {0}")]
    Repo(#[from] RepoError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server terminated with error: {0}")]
    Serve(std::io::Error),
}

/// Builds the repository selected by `store`.
pub fn build_repository(store: &StoreConfig) -> Result<SharedRepository, StartupError> {
    match store {
        StoreConfig::Sqlite(path) => {
            let conn = open_db(path)?;
            let repo = SharedSqliteRepository::try_new(conn)?;
            info!(
                "event=store_ready module=api store=sqlite path={}",
                path.display()
            );
            Ok(Arc::new(repo))
        }
        StoreConfig::Memory => {
            info!("event=store_ready module=api store=memory");
            Ok(Arc::new(InMemoryPopsicleRepository::seeded()))
        }
    }
}

/// Serves the inventory API until ctrl-c or SIGTERM.
pub async fn serve(config: ServerConfig) -> Result<(), StartupError> {
    let repo = build_repository(&config.store)?;
    let state = ApiState::new(repo, &config.base_path);
    let app = router(state);

    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listen.clone(),
            source,
        })?;
    info!(
        "event=server_start module=api status=ok listen={} base_path={}",
        config.listen, config.base_path
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = ctrl_c().await {
            error!("event=signal_install module=api status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
        info!("event=shutdown module=api signal=ctrl_c");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown module=api signal=sigterm");
            }
            Err(err) => {
                error!("event=signal_install module=api status=error signal=sigterm error={err}");
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
}
