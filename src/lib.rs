pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod geo;
pub mod i18n;
pub mod ipc;
pub mod legacy;
pub mod model;
pub mod normalize;
pub mod store;
