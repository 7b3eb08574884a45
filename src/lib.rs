//! Core of a content-publishing platform: users author publications, send
//! them through an editorial review workflow, and readers comment on,
//! favorite, and download published works as rendered PDF documents.
//!
//! HTTP framing, authentication and password handling are external
//! collaborators; this crate exposes the domain operations, the
//! notification dispatcher and the document renderer behind plain Rust
//! interfaces.

#[macro_use]
extern crate diesel;

pub use self::config::Config;

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod events;
pub mod files;
pub mod images;
pub mod models;
pub mod permissions;
pub mod render;
pub mod store;
pub mod utils;

pub type Result<T, E = failure::Error> = std::result::Result<T, E>;
