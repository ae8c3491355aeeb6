pub mod cli;
pub mod commands;
pub mod config;
pub mod contract;
pub mod error;
pub mod keys;
pub mod payload;
pub mod rpc;
pub mod signer;
pub mod tx_builder;

pub use error::{ClientError, Result};
