//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use tubely_core::{Config, StorageBackend};
use tubely_storage::{create_local_storage, create_storage, LocalStorage, Storage};

/// Setup the object store. With the local backend the concrete store is also
/// returned so `/media` can verify the URLs it signs.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    tracing::info!("Initializing storage...");

    let (storage, local_media): (Arc<dyn Storage>, Option<Arc<LocalStorage>>) =
        match config.storage_backend().unwrap_or(StorageBackend::S3) {
            StorageBackend::Local => {
                let local = Arc::new(create_local_storage(config).await?);
                (local.clone(), Some(local))
            }
            StorageBackend::S3 => (create_storage(config).await?, None),
        };

    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        "Storage initialized successfully"
    );

    Ok((storage, local_media))
}
