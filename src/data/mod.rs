//! 数据层：错误类型、扫描缓存与持久搜索路径存储

pub mod cache;
pub mod error;
pub mod store;

pub use cache::{ScanCache, CACHE_DURATION};
pub use error::{DataError, Result};
pub use store::{system_store, DurableStore, EnvFileStore, SystemStore, SEARCH_PATH_KEY};

#[cfg(windows)]
pub use store::RegistryStore;
