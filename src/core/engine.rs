//! Catalog - owns the extracted records and their facet indexes
//!
//! Provides the high-level API the CLI and interactive layers drive:
//! load once, then recompute the candidate set for any selection.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::catver::{parse_catver_file, CategoryMap};
use super::extract::{extract, ExtractionResult, MachineRecord, Warning};
use super::filter::{CandidateSet, FilterSelection};
use super::index::{FacetIndex, FacetIndexes};
use super::Facet;

/// Fatal failures while loading the catalog sources
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The machine catalog is not well formed XML
    #[error("Failed to parse machine catalog {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

/// Immutable, fully indexed machine catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<MachineRecord>,
    warnings: Vec<Warning>,
    all_games: CandidateSet,
    clones: BTreeSet<String>,
    indexes: FacetIndexes,
}

impl Catalog {
    /// Load the XML catalog and optional category file from disk
    pub fn load(xml_path: &Path, catver_path: Option<&Path>) -> Result<Self, CatalogError> {
        tracing::info!("Loading machine catalog {}", xml_path.display());
        let xml = std::fs::read_to_string(xml_path).map_err(|source| CatalogError::Io {
            path: xml_path.to_path_buf(),
            source,
        })?;

        let categories = catver_path
            .map(|path| {
                tracing::info!("Loading categories {}", path.display());
                parse_catver_file(path).map_err(|source| CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .transpose()?;

        Self::from_sources(&xml, categories.as_ref()).map_err(|source| CatalogError::Xml {
            path: xml_path.to_path_buf(),
            source,
        })
    }

    /// Build a catalog from in-memory sources
    pub fn from_sources(
        xml: &str,
        categories: Option<&CategoryMap>,
    ) -> Result<Self, roxmltree::Error> {
        Ok(Self::from_extraction(extract(xml, categories)?))
    }

    /// Index an extraction result
    pub fn from_extraction(result: ExtractionResult) -> Self {
        let ExtractionResult {
            records, warnings, ..
        } = result;

        let all_games = records.iter().map(|r| r.name.clone()).collect();
        let clones = records
            .iter()
            .filter(|r| r.is_clone())
            .map(|r| r.name.clone())
            .collect();
        let indexes = FacetIndexes::build(&records);

        Self {
            records,
            warnings,
            all_games,
            clones,
            indexes,
        }
    }

    pub fn records(&self) -> &[MachineRecord] {
        &self.records
    }

    pub fn record(&self, name: &str) -> Option<&MachineRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every runnable machine
    pub fn all_games(&self) -> &CandidateSet {
        &self.all_games
    }

    pub fn clones(&self) -> &BTreeSet<String> {
        &self.clones
    }

    pub fn index(&self, facet: Facet) -> &FacetIndex {
        self.indexes.get(facet)
    }

    /// Known values of a facet with their machine counts, sorted by value
    pub fn facet_values(&self, facet: Facet) -> Vec<(String, usize)> {
        let index = self.index(facet);
        index
            .values()
            .into_iter()
            .map(|value| (value.to_string(), index.bucket(value).len()))
            .collect()
    }

    /// Candidate set for `selection`, recomputed from the full catalog
    pub fn recompute(&self, selection: &FilterSelection) -> CandidateSet {
        selection.apply(&self.indexes, &self.clones, &self.all_games)
    }
}
