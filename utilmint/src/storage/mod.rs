// Copyright (c) 2024 Botho Foundation

mod store;

pub use store::EngineStore;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store is inconsistent: {0}")]
    Corrupt(String),
}

impl From<lmdb::Error> for StoreError {
    fn from(e: lmdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
