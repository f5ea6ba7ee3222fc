//! Error types for blunder-check-core

use thiserror::Error;

use crate::engine::EngineError;
use crate::parser::PgnError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("PGN error: {0}")]
    Pgn(#[from] PgnError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TOML parsing failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
