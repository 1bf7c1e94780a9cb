pub mod aggregate;
pub mod atlas;
pub mod color;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod modes;
pub mod output;
pub mod render;
pub mod selection;
