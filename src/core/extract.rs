//! Record extraction from the XML machine catalog
//!
//! Each top-level `<machine>` (or legacy `<game>`) element becomes one
//! [`MachineRecord`]. Malformed machines are kept with whatever facet data
//! they do carry; the problems are collected as [`Warning`]s.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::catver::CategoryMap;
use super::{MIXED_VALUE, NONE_VALUE};

/// Control types for which a button count is meaningful
pub const BUTTON_CONTROL_TYPES: &[&str] = &[
    "joy",
    "stick",
    "dial",
    "only_buttons",
    "lightgun",
    "trackball",
    "doublejoy",
    "paddle",
    "mouse",
    "pedal",
];

/// Driver attributes of a machine with exactly one `<driver>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub status: Option<String>,
    pub emulation: Option<String>,
    pub savestate: Option<String>,
}

/// One runnable catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    /// Unique machine name, also the ROM archive stem
    pub name: String,
    /// Parent machine for clones
    pub clone_of: Option<String>,
    /// Declared player count, `None` when the input block lacks one
    pub players: Option<String>,
    /// Consensus control type; `None` when the input block was missing or repeated
    pub control_type: Option<String>,
    /// Consensus button count, only set for [`BUTTON_CONTROL_TYPES`]
    pub button_count: Option<String>,
    /// Consensus joystick directions
    pub ways: Option<String>,
    /// `None` when the driver block was missing or repeated
    pub driver: Option<DriverInfo>,
    pub categories: BTreeSet<String>,
}

impl MachineRecord {
    pub fn is_clone(&self) -> bool {
        self.clone_of.is_some()
    }

    /// Driver emulation grade, if a single driver block was present
    pub fn emulation(&self) -> Option<&str> {
        self.driver.as_ref().and_then(|d| d.emulation.as_deref())
    }

    /// Whether the button-count facet applies to this machine's control type
    pub fn has_button_controls(&self) -> bool {
        self.control_type
            .as_deref()
            .is_some_and(|t| BUTTON_CONTROL_TYPES.contains(&t))
    }
}

/// Data-quality problem found while extracting a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingName,
    DuplicateName,
    MissingInput,
    TooManyInputs,
    MissingPlayers,
    MissingDriver,
    TooManyDrivers,
}

impl WarningKind {
    pub fn message(&self) -> &'static str {
        match self {
            WarningKind::MissingName => "machine element has no name",
            WarningKind::DuplicateName => "duplicate machine name, later entry ignored",
            WarningKind::MissingInput => "missing input block",
            WarningKind::TooManyInputs => "too many input blocks",
            WarningKind::MissingPlayers => "missing player count",
            WarningKind::MissingDriver => "missing driver block",
            WarningKind::TooManyDrivers => "too many driver blocks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub machine: String,
    pub kind: WarningKind,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.machine, self.kind.message())
    }
}

/// Everything the extractor produced, owned by the caller
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Runnable machines in catalog order
    pub records: Vec<MachineRecord>,
    pub warnings: Vec<Warning>,
    /// Machines dropped because they are marked `runnable="no"`
    pub unrunnable: usize,
}

impl ExtractionResult {
    fn warn(&mut self, machine: &str, kind: WarningKind) {
        tracing::warn!("{}: {}", machine, kind.message());
        self.warnings.push(Warning {
            machine: machine.to_string(),
            kind,
        });
    }
}

/// Derive one value from many controls: the shared value when all agree,
/// [`MIXED_VALUE`] otherwise. A missing attribute counts as [`NONE_VALUE`].
///
/// Returns `None` for an empty input.
pub fn consensus<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut values = values.into_iter();
    let first = values.next()?;
    if values.any(|v| v != first) {
        return Some(MIXED_VALUE.to_string());
    }
    Some(first.unwrap_or(NONE_VALUE).to_string())
}

/// Extract records from catalog XML and attach categories from a parsed
/// category file.
pub fn extract(
    xml: &str,
    categories: Option<&CategoryMap>,
) -> Result<ExtractionResult, roxmltree::Error> {
    let mut result = parse_catalog_xml(xml)?;

    if let Some(categories) = categories {
        for record in &mut result.records {
            if let Some(cats) = categories.get(&record.name) {
                record.categories = cats.clone();
            }
        }
    }

    Ok(result)
}

/// Parse catalog XML into runnable machine records
pub fn parse_catalog_xml(xml: &str) -> Result<ExtractionResult, roxmltree::Error> {
    // Full catalogs ship with an inline DTD
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;

    let doc = roxmltree::Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    let mut result = ExtractionResult::default();
    let mut seen: HashSet<String> = HashSet::new();

    for machine in root
        .children()
        .filter(|n| n.has_tag_name("machine") || n.has_tag_name("game"))
    {
        let Some(name) = machine.attribute("name") else {
            result.warn("<unnamed>", WarningKind::MissingName);
            continue;
        };

        if machine.attribute("runnable") == Some("no") {
            tracing::trace!("skipping unrunnable {}", name);
            result.unrunnable += 1;
            continue;
        }

        if !seen.insert(name.to_string()) {
            result.warn(name, WarningKind::DuplicateName);
            continue;
        }

        tracing::debug!("processing {}", name);
        let record = parse_machine(&machine, name, &mut result);
        result.records.push(record);
    }

    tracing::info!(
        "Extracted {} machines ({} unrunnable skipped, {} warnings)",
        result.records.len(),
        result.unrunnable,
        result.warnings.len()
    );

    Ok(result)
}

fn parse_machine(
    machine: &roxmltree::Node,
    name: &str,
    result: &mut ExtractionResult,
) -> MachineRecord {
    let mut record = MachineRecord {
        name: name.to_string(),
        clone_of: machine.attribute("cloneof").map(str::to_string),
        ..Default::default()
    };

    let inputs: Vec<_> = machine
        .children()
        .filter(|n| n.has_tag_name("input"))
        .collect();

    match inputs.as_slice() {
        [] => result.warn(name, WarningKind::MissingInput),
        [input] => {
            record.players = input.attribute("players").map(str::to_string);
            match record.players.as_deref().map(str::parse::<u32>) {
                None => result.warn(name, WarningKind::MissingPlayers),
                // Controls of machines nobody can play are not indexed
                Some(Ok(0)) | Some(Err(_)) => {}
                Some(Ok(_)) => parse_controls(input, &mut record),
            }
        }
        _ => result.warn(name, WarningKind::TooManyInputs),
    }

    let drivers: Vec<_> = machine
        .children()
        .filter(|n| n.has_tag_name("driver"))
        .collect();

    match drivers.as_slice() {
        [] => result.warn(name, WarningKind::MissingDriver),
        [driver] => {
            record.driver = Some(DriverInfo {
                status: driver.attribute("status").map(str::to_string),
                emulation: driver.attribute("emulation").map(str::to_string),
                savestate: driver.attribute("savestate").map(str::to_string),
            });
        }
        _ => result.warn(name, WarningKind::TooManyDrivers),
    }

    record
}

fn parse_controls(input: &roxmltree::Node, record: &mut MachineRecord) {
    let controls: Vec<_> = input
        .children()
        .filter(|n| n.has_tag_name("control"))
        .collect();

    if controls.is_empty() {
        record.control_type = Some(NONE_VALUE.to_string());
        return;
    }

    record.control_type = consensus(controls.iter().map(|c| c.attribute("type")));
    record.ways = consensus(controls.iter().map(|c| c.attribute("ways")));

    if record.has_button_controls() {
        record.button_count = consensus(controls.iter().map(|c| c.attribute("buttons")));
    }
}
