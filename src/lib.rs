pub mod aggregate;
pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod filter;
pub mod fs_util;
pub mod kegg;
pub mod output;
pub mod plot;
pub mod resolve;
pub mod summary;
