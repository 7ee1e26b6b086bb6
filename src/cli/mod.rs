//! CLI module - Command line interface definitions and handlers

pub mod commands;
pub mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::{Facet, FilterSelection};

/// ROM Filter - Curate an arcade ROM set
///
/// Reads the full driver information XML and an optional category file,
/// narrows the machine list by controls, players, driver status and
/// category, then copies the matching ROM archives.
#[derive(Parser, Debug)]
#[command(name = "rom-filter")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "🕹 Filter an arcade machine catalog and copy the matching ROMs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Output format for machine parsing
    #[arg(long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every filter and the values the catalog holds for it
    Filters(CatalogArgs),

    /// Print the machines matching the filters
    List(ListArgs),

    /// Copy the ROM archives of the matching machines
    Copy(CopyArgs),

    /// Guided interactive mode (default)
    Interactive(InteractiveArgs),
}

/// Catalog sources, falling back to the config file
#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    /// Full driver information XML (`mame -listxml`)
    #[arg(long)]
    pub xml: Option<PathBuf>,

    /// Category file (catver.ini)
    #[arg(long)]
    pub catver: Option<PathBuf>,
}

/// Filter flags; each list is comma separated and empty means "everything"
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Don't include any clones
    #[arg(long)]
    pub exclude_clones: bool,

    /// Include control types (joy, dial, trackball, mixed, None, ...)
    #[arg(long, value_delimiter = ',')]
    pub include_control_type: Vec<String>,

    /// Include games with this many buttons
    #[arg(long, value_delimiter = ',')]
    pub include_buttons: Vec<String>,

    /// Keep games with at most this many buttons (overrides --include-buttons)
    #[arg(long)]
    pub max_buttons: Option<u32>,

    /// Include games with this many joystick directions
    #[arg(long, value_delimiter = ',')]
    pub include_ways: Vec<String>,

    /// Include games for this many players
    #[arg(long, value_delimiter = ',')]
    pub include_players: Vec<String>,

    /// Include games with this driver status
    #[arg(long, value_delimiter = ',')]
    pub include_status: Vec<String>,

    /// Include games with this level of emulation
    #[arg(long, value_delimiter = ',')]
    pub include_emulation: Vec<String>,

    /// Include games with this level of savestate support
    #[arg(long, value_delimiter = ',')]
    pub include_savestate: Vec<String>,

    /// Include games in this category
    #[arg(long, value_delimiter = ',')]
    pub include_category: Vec<String>,
}

impl FilterArgs {
    /// Values given on the command line for a facet
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::ControlType => &self.include_control_type,
            Facet::Buttons => &self.include_buttons,
            Facet::Ways => &self.include_ways,
            Facet::Players => &self.include_players,
            Facet::Status => &self.include_status,
            Facet::Emulation => &self.include_emulation,
            Facet::Savestate => &self.include_savestate,
            Facet::Category => &self.include_category,
        }
    }

    /// Layer the command line over a base selection from the config file
    pub fn apply(&self, mut selection: FilterSelection) -> FilterSelection {
        selection.exclude_clones |= self.exclude_clones;
        if self.max_buttons.is_some() {
            selection.max_buttons = self.max_buttons;
        }
        for facet in Facet::ALL {
            let values = self.values(facet);
            if !values.is_empty() {
                selection.set_included(facet, values.iter().cloned());
            }
        }
        selection
    }
}

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Only print the number of matching machines
    #[arg(long, short)]
    pub count: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct CopyArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Directory holding <machine>.zip archives
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination directory
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Dry run - just output what would be done, without copying any files
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Verify copies with blake3 hashes
    #[arg(long)]
    pub verify: bool,

    /// Continue on copy errors (log and skip bad files)
    #[arg(long, short)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Parser, Default)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable (default)
    #[default]
    Human,
    /// JSON output
    Json,
}
