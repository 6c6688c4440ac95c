use crate::error::StorageError;

pub mod config;
pub mod session;

type Result<T> = std::result::Result<T, StorageError>;
