//! Persistence gateway for todo records.
//!
//! Handlers only see [`TodoStore`]; which backend sits behind it is decided
//! once at startup from [`StoreConfig`](crate::config::StoreConfig).

pub mod memory;
pub mod spanner;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::models::{NewTodo, Todo, TodoChanges};

pub use memory::MemoryStore;
pub use spanner::SpannerStore;

/// Datastore capability consumed by the todo handlers
///
/// Every method fails with an opaque error; callers do not distinguish a
/// missing row from a backend outage.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Insert a new record, generating its id and timestamps
    async fn create(&self, new: NewTodo) -> Result<Todo>;

    /// Overwrite the supplied fields of an existing record and refresh
    /// `updated_at`. Fails if no record has this id.
    async fn update(&self, id: &str, changes: TodoChanges) -> Result<Todo>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>>;

    /// Remove a record and return it as it was before removal. Fails if no
    /// record has this id.
    async fn delete(&self, id: &str) -> Result<Todo>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> Result<()>;
}

/// Build the store selected by configuration
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn TodoStore>> {
    match config {
        StoreConfig::Spanner(spanner) => Ok(Arc::new(SpannerStore::from_config(spanner).await?)),
        StoreConfig::Memory => {
            tracing::info!("Using in-memory todo store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
