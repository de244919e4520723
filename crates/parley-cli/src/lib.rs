//! Parley command-line tools: an interactive A2A chat client and an agent
//! card validator. The binaries in `src/bin` are thin wrappers over this crate.

pub mod chat;
pub mod config;
pub mod logging;
pub mod render;
pub mod validate;
