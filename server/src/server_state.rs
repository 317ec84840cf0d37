use std::sync::Arc;

use mop_data_management::{TripStore, TripStoreError};
use mop_lib::map_renderer::MapRenderer;
use tokio::sync::Mutex;

pub struct ServerState {
    // Serializes reads and appends, the CSV has a single writer.
    pub store: Mutex<TripStore>,
    pub renderer: MapRenderer,
}

impl ServerState {
    pub fn new(store: TripStore, renderer: MapRenderer) -> Self {
        Self {
            store: Mutex::new(store),
            renderer,
        }
    }

    /// Runs `f` against the locked store on the blocking pool, the store does plain file I/O.
    pub async fn with_store<T, F>(self: &Arc<Self>, f: F) -> Result<T, TripStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&TripStore) -> Result<T, TripStoreError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let store = state.store.blocking_lock();
            f(&*store)
        })
        .await
        .map_err(|err| TripStoreError::Storage(format!("Store task failed: {}", err)))?
    }
}
