//! Category file parsing (`catver.ini`)
//!
//! The file is INI shaped: `machine = Primary / Secondary * Mature *` pairs
//! under a `[Category]` section, usually preceded by a comment banner and
//! frontend folder settings. Anything that is not a well formed pair is
//! ignored, only I/O failures are errors.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::Path;

/// Machine name to the categories it belongs to
pub type CategoryMap = HashMap<String, BTreeSet<String>>;

const CATEGORY_SECTION: &str = "Category";
const QUIZ: &str = "Quiz";
const MATURE: &str = "Mature";

/// Read and parse a category file.
///
/// Non UTF-8 bytes are replaced rather than rejected, these files are often
/// Latin-1.
pub fn parse_catver_file(path: &Path) -> io::Result<CategoryMap> {
    let bytes = std::fs::read(path)?;
    Ok(parse_catver(&String::from_utf8_lossy(&bytes)))
}

/// Parse category file contents.
///
/// Entries are taken from the `[Category]` section, or from the first
/// section holding any pairs when no such section exists.
pub fn parse_catver(content: &str) -> CategoryMap {
    let mut sections: Vec<(Option<String>, Vec<(String, String)>)> = vec![(None, Vec::new())];

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push((Some(header.trim().to_string()), Vec::new()));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            tracing::trace!("catver line {} is not a pair, ignoring", line_no + 1);
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        if let Some((_, entries)) = sections.last_mut() {
            entries.push((key.to_string(), value.trim().to_string()));
        }
    }

    let chosen = sections
        .iter()
        .find(|(name, _)| {
            name.as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(CATEGORY_SECTION))
        })
        .or_else(|| {
            sections
                .iter()
                .find(|(name, entries)| name.is_some() && !entries.is_empty())
        });

    let mut map = CategoryMap::new();
    let Some((section, entries)) = chosen else {
        tracing::info!("No category section found, category filter will be empty");
        return map;
    };

    for (machine, value) in entries {
        let categories = categorize(value);
        if categories.is_empty() {
            continue;
        }
        if map.insert(machine.clone(), categories).is_some() {
            tracing::debug!("catver lists {} more than once, keeping the last entry", machine);
        }
    }

    tracing::info!(
        "Loaded categories for {} machines from [{}]",
        map.len(),
        section.as_deref().unwrap_or_default()
    );

    map
}

/// Derive the category set for one category string
pub fn categorize(value: &str) -> BTreeSet<String> {
    let tokens: Vec<&str> = value
        .split(['/', '*'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let mut categories = BTreeSet::new();
    let Some(&primary) = tokens.first() else {
        return categories;
    };

    if primary == QUIZ {
        let language = tokens
            .get(1)
            .and_then(|second| second.split_whitespace().last());
        match language {
            Some(language) => categories.insert(format!("{}: {}", QUIZ, language)),
            None => categories.insert(QUIZ.to_string()),
        };
    } else {
        categories.insert(primary.to_string());
    }

    if tokens.contains(&MATURE) {
        categories.insert(MATURE.to_string());
    }

    categories
}
