//! Watches the focused desktop application and runs the extension mapped to it.
//!
//! Binaries embed the pieces in this order: load a [`config::Config`], build an
//! [`services::ExtensionFactory`] (built-in kinds plus any of their own), load
//! the [`services::PluginRegistry`] from the plugin directory, then run a
//! [`services::FocusMonitor`] over a [`services::focus_query::FocusQuery`].

pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod utils;
