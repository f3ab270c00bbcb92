// Library interface for aula-board-server
// Exposes modules for integration testing

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod diff;
pub mod error;
pub mod hub;
pub mod logging;
pub mod models;
pub mod observer;
pub mod sheet;
