//! Startup sequencing: StorageInit → PluginLoad → ServerInit.
//!
//! Each stage gets the previous stage's output, so a later stage cannot start
//! without the earlier one having succeeded. The first failure ends startup.

use std::{fmt, future::Future, time::Instant};

use {
    async_trait::async_trait,
    tracing::{error, info},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    StorageInit,
    PluginLoad,
    ServerInit,
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StorageInit => "storage init",
            Self::PluginLoad => "plugin load",
            Self::ServerInit => "server init",
        })
    }
}

/// Startup aborted in `stage`.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {cause:#}")]
pub struct BootError {
    pub stage: BootStage,
    pub cause: anyhow::Error,
}

#[async_trait]
pub trait BootStages: Send {
    type Storage: Send;
    type Loaded: Send;

    async fn storage_init(&mut self) -> anyhow::Result<Self::Storage>;
    async fn plugin_load(&mut self, storage: Self::Storage) -> anyhow::Result<Self::Loaded>;
    /// Runs until the server stops.
    async fn server_init(&mut self, loaded: Self::Loaded) -> anyhow::Result<()>;
}

pub async fn run<S: BootStages>(stages: &mut S) -> Result<(), BootError> {
    let storage = stage(BootStage::StorageInit, stages.storage_init()).await?;
    let loaded = stage(BootStage::PluginLoad, stages.plugin_load(storage)).await?;
    stage(BootStage::ServerInit, stages.server_init(loaded)).await
}

async fn stage<T>(
    stage: BootStage,
    body: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, BootError> {
    info!(stage = %stage, "boot stage starting");
    let started = Instant::now();
    match body.await {
        Ok(out) => {
            info!(
                stage = %stage,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "boot stage finished"
            );
            Ok(out)
        },
        Err(cause) => {
            error!(stage = %stage, error = %format!("{cause:#}"), "boot stage failed");
            Err(BootError { stage, cause })
        },
    }
}
