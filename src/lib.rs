// ABOUTME: Library crate for aider-bridge exposing the engine and its building blocks

pub mod channel;
pub mod config;
pub mod dictation;
pub mod engine;
pub mod filter;
pub mod prompts;
pub mod session;
pub mod sync;
pub mod timer;
pub mod tmux;
pub mod workspace;
