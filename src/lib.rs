//! aerofiles - a small file manager API over an object-storage bucket
//!
//! Upload, list, download, view, delete and create-folder operations backed
//! by a flat key namespace, where folders are key prefixes.

pub mod cli;
pub mod config;
pub mod file_storage;
pub mod http_server;
pub mod observability;
