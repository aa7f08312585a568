pub mod error;
pub mod record;
pub mod adapter;
pub mod sink;
pub mod client;
pub mod writer;
pub mod layer;

#[cfg(feature = "logflare")]
pub mod logflare;

#[cfg(feature = "discord")]
pub mod discord;

pub mod backend;
pub mod env;
pub mod init;
pub mod noop_sink;
