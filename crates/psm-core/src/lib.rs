//! psm-core: World folder bookkeeping for a Palworld dedicated server
//!
//! This crate focuses on a small, well-factored surface:
//! - Fixed server directory layout (saves, trash, live settings, mod dirs)
//! - INI key lookup for the tool config and the server's active world id
//! - World and trash listings with display names from `name.txt`
//! - World operations (switch, create, trash, restore, rename, launch, copy)
//! - Zip archive of a world folder
//!
pub mod archive;
pub mod config;
pub mod error;
pub mod ini;
pub mod layout;
pub mod manager;
pub mod mods;
pub mod worlds;

pub use config::ToolConfig;
pub use error::{ManagerError, Result};
pub use layout::ServerLayout;
pub use manager::{CreateReport, SaveManager, SwitchReport, detect_active_id};
pub use mods::{CopiedItem, CopySelection};
pub use worlds::{WorldEntry, list_trash, list_worlds, next_world_name, unique_name};
