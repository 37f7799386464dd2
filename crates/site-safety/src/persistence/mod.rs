//! Tenant-scoped data access boundary.

mod gateway;
mod memory;

pub use gateway::{ActionQuery, PersistenceGateway, RepositoryError};
pub use memory::MemoryGateway;
