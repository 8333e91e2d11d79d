//! On-disk staging of chunks for uploads that have not been finalized.

pub mod staging;

pub use staging::ChunkStaging;
