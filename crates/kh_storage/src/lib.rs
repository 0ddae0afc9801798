use std::sync::Arc;

use kh_core::{Error, Result, Storage};

pub mod backends;

pub use backends::memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteStorage;

/// Build a storage backend by name. `memory` needs no path; `sqlite`
/// uses the given path or `khabar.db`.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_storage(
    kind: &str,
    database_path: Option<&str>,
) -> Result<Arc<dyn Storage>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = database_path.unwrap_or("khabar.db");
            Ok(Arc::new(
                backends::sqlite::SqliteStorage::new(std::path::Path::new(path)).await?,
            ))
        }
        other => Err(Error::Storage(format!(
            "unknown storage backend: {}",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::create_storage;
    pub use super::MemoryStorage;
    pub use kh_core::{ArticleStatus, ArticleStorage, DeviceTokenStorage, Storage};
}
