// src/acquisition/mod.rs
//! Signal ingestion and buffering components

pub mod channels;
pub mod ingest;
pub mod sample_buffer;

pub use channels::*;
pub use ingest::*;
pub use sample_buffer::*;
