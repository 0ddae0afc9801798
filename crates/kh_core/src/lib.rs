pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use storage::{ArticleStatus, ArticleStorage, DeviceTokenStorage, Storage};
pub use types::{Article, ArticlePage, ArticleQuery, Language, Source};

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{Error, Result};
    pub use crate::storage::{ArticleStatus, ArticleStorage, DeviceTokenStorage, Storage};
    pub use crate::types::{Article, ArticlePage, ArticleQuery, Language, Source};
}
