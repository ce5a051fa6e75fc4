pub mod aggregator;
pub mod apply;
pub mod backend;
pub mod config;
pub mod download;
pub mod error;
pub mod ipc;
pub mod library;
pub mod matcher;
pub mod models;
pub mod paths;
pub mod retention;
pub mod scheduler;
pub mod sources;
pub mod store;
pub mod translate;
pub mod wallpapers;
