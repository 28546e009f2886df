pub mod boundary_retriever;
pub mod health_retriever;
pub mod loader;
pub mod retry;
pub mod tile_retriever;
