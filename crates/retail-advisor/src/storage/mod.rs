pub mod lance_store;

pub use lance_store::{LanceStore, SearchHit};
