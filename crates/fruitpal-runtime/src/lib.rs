//! Background refresh for Fruitpal.
//!
//! Keeps an aggregate snapshot of one trade data file current while the file
//! changes on disk: [`watcher`] turns filesystem events into change
//! notifications, [`refresh_controller`] re-parses and publishes snapshots
//! atomically, and [`orchestrator`] wires both into a tokio task.

pub mod orchestrator;
pub mod refresh_controller;
pub mod watcher;

pub use fruitpal_core as core;
pub use fruitpal_data as data;
