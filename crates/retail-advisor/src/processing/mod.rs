pub mod chunker;
pub mod csv_loader;

pub use chunker::{ChunkResult, TextChunker};
pub use csv_loader::load_csv;
