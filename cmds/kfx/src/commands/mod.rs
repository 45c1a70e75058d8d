//! Command handlers for the kfx CLI.

pub mod apply;
pub mod show;
pub mod util;
