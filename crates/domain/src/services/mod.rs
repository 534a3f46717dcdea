//! 外部服务接口

pub mod blob_store;

pub use blob_store::{BlobStore, BlobStoreResult};

#[cfg(feature = "testing")]
pub use blob_store::MockBlobStore;
