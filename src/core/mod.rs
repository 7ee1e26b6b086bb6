//! Core module - The heart of ROM Filter
//!
//! Contains record extraction, the facet indexes and the filter engine.

mod catver;
mod engine;
mod extract;
mod filter;
mod index;

pub use catver::{categorize, parse_catver, parse_catver_file, CategoryMap};
pub use engine::{Catalog, CatalogError};
pub use extract::{
    consensus, extract, parse_catalog_xml, DriverInfo, ExtractionResult, MachineRecord, Warning,
    WarningKind, BUTTON_CONTROL_TYPES,
};
pub use filter::{button_range, filter, CandidateSet, FilterSelection};
pub use index::{build_index, FacetIndex, FacetIndexes};

use serde::{Deserialize, Serialize};

/// Facet value used when a machine carries no value for an attribute.
///
/// This is a real, selectable bucket key and not an error marker.
pub const NONE_VALUE: &str = "None";

/// Facet value used when a machine's controls disagree on an attribute
pub const MIXED_VALUE: &str = "mixed";

/// Independent filterable attribute dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Facet {
    ControlType,
    Buttons,
    Ways,
    Players,
    Status,
    Emulation,
    Savestate,
    Category,
}

impl Facet {
    /// Every facet, in display order
    pub const ALL: [Facet; 8] = [
        Facet::ControlType,
        Facet::Buttons,
        Facet::Ways,
        Facet::Players,
        Facet::Status,
        Facet::Emulation,
        Facet::Savestate,
        Facet::Category,
    ];

    /// Stable identifier used on the command line and in config files
    pub fn key(&self) -> &'static str {
        match self {
            Facet::ControlType => "control-type",
            Facet::Buttons => "buttons",
            Facet::Ways => "ways",
            Facet::Players => "players",
            Facet::Status => "status",
            Facet::Emulation => "emulation",
            Facet::Savestate => "savestate",
            Facet::Category => "category",
        }
    }

    /// Human readable title for menus
    pub fn title(&self) -> &'static str {
        match self {
            Facet::ControlType => "Control Types",
            Facet::Buttons => "Number of Buttons",
            Facet::Ways => "Joystick Directions",
            Facet::Players => "Number of Players",
            Facet::Status => "Driver Status",
            Facet::Emulation => "Emulation Quality",
            Facet::Savestate => "Savestate Support",
            Facet::Category => "Categories",
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Progress information for callbacks
#[derive(Debug, Clone)]
pub struct Progress {
    /// Total items to process
    pub total: usize,
    /// Completed items
    pub completed: usize,
    /// Machine name just processed
    pub current: String,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            current: String::new(),
        }
    }

    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f32 / self.total as f32) * 100.0
        }
    }
}
