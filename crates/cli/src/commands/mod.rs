pub mod ask;
pub mod cards;
pub mod config_cmd;
pub mod ingest;
pub mod runtime;
pub mod srs;
pub mod text;

#[cfg(feature = "hub")]
pub mod tokenizer;
