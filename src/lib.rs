//! ROM Filter Library
//!
//! Reads a MAME full driver information XML plus an optional `catver.ini`,
//! groups every machine by control type, buttons, joystick ways, players,
//! driver status and category, and narrows the catalog with per-facet
//! include lists before copying the matching `<name>.zip` archives.
//!
//! # Example
//!
//! ```no_run
//! use rom_filter::core::{Catalog, Facet, FilterSelection};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::load(Path::new("mame.xml"), Some(Path::new("catver.ini")))?;
//!
//!     let selection = FilterSelection::new()
//!         .with_included(Facet::ControlType, ["joy"])
//!         .with_included(Facet::Players, ["1", "2"]);
//!     let games = catalog.recompute(&selection);
//!
//!     println!("{} of {} games match", games.len(), catalog.all_games().len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod status;

// Re-export commonly used types
pub use config::Config;
pub use core::{Catalog, CatalogError, CandidateSet, Facet, FilterSelection, MachineRecord};
pub use export::{copy_roms, CopyError, CopyOptions, CopyReport};
pub use status::StatusIcons;
