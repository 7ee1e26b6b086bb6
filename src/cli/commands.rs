//! Non-interactive command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::{CatalogArgs, CopyArgs, ListArgs, OutputFormat};
use crate::config::Config;
use crate::core::{CandidateSet, Catalog, Facet};
use crate::export::{copy_roms, CopyError, CopyOptions, CopyReport};
use crate::StatusIcons;

/// Resolve catalog paths from the command line, then the config file
pub fn resolve_sources(args: &CatalogArgs, config: &Config) -> Result<(PathBuf, Option<PathBuf>)> {
    let xml = args
        .xml
        .clone()
        .or_else(|| config.paths.xml.clone())
        .context("No machine catalog given: pass --xml or set paths.xml in the config")?;
    let catver = args.catver.clone().or_else(|| config.paths.catver.clone());
    Ok((xml, catver))
}

/// Load the catalog and log a warning summary
pub fn load_catalog(xml: &Path, catver: Option<&Path>) -> Result<Catalog> {
    let catalog = Catalog::load(xml, catver)?;
    if !catalog.warnings().is_empty() {
        tracing::warn!(
            "{} data-quality warnings while reading {}",
            catalog.warnings().len(),
            xml.display()
        );
    }
    Ok(catalog)
}

#[derive(Serialize)]
struct FacetListing {
    facet: Facet,
    values: Vec<ValueCount>,
}

#[derive(Serialize)]
struct ValueCount {
    value: String,
    machines: usize,
}

/// `filters` - list every facet and its values
pub fn run_filters(args: &CatalogArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let (xml, catver) = resolve_sources(args, config)?;
    let catalog = load_catalog(&xml, catver.as_deref())?;

    let listings: Vec<FacetListing> = Facet::ALL
        .iter()
        .map(|&facet| FacetListing {
            facet,
            values: catalog
                .facet_values(facet)
                .into_iter()
                .map(|(value, machines)| ValueCount { value, machines })
                .collect(),
        })
        .collect();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings)?),
        OutputFormat::Human => {
            println!(
                "{} machines, {} clones, {} warnings\n",
                catalog.all_games().len().to_string().bright_white(),
                catalog.clones().len(),
                catalog.warnings().len()
            );
            for listing in &listings {
                println!("{} ({}):", listing.facet.title().bright_cyan(), listing.facet);
                if listing.values.is_empty() {
                    println!("  {}", "<no data>".dimmed());
                }
                for v in &listing.values {
                    println!("  {:<32} {}", v.value, v.machines);
                }
                println!();
            }
        }
    }

    Ok(())
}

/// `list` - print the matching machines
pub fn run_list(args: &ListArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let (xml, catver) = resolve_sources(&args.catalog, config)?;
    let catalog = load_catalog(&xml, catver.as_deref())?;
    let selection = args.filter.apply(config.filter.to_selection());
    let candidates = catalog.recompute(&selection);

    match output {
        OutputFormat::Json if args.count => println!("{}", candidates.len()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&candidates)?),
        OutputFormat::Human => {
            if !args.count {
                for name in &candidates {
                    println!("{}", name);
                }
            }
            println!(
                "{} {} of {} games are included",
                StatusIcons::INFO.bright_cyan(),
                candidates.len().to_string().bright_white(),
                catalog.all_games().len()
            );
        }
    }

    Ok(())
}

/// `copy` - filter, then copy the matching archives
pub async fn run_copy(args: &CopyArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let (xml, catver) = resolve_sources(&args.catalog, config)?;
    let source = args
        .source
        .clone()
        .or_else(|| config.paths.roms_source.clone())
        .context("No ROM directory given: pass --source or set paths.roms_source")?;
    let dest = args
        .dest
        .clone()
        .or_else(|| config.paths.roms_dest.clone())
        .context("No destination given: pass --dest or set paths.roms_dest")?;

    let catalog = load_catalog(&xml, catver.as_deref())?;
    let selection = args.filter.apply(config.filter.to_selection());
    let candidates = catalog.recompute(&selection);

    let mut options = config.copy.to_options(source, dest);
    options.dry_run = args.dry_run;
    options.verify_hash |= args.verify;
    options.continue_on_error |= args.continue_on_error;

    if output == OutputFormat::Human {
        println!(
            "{} {} {} games to {}",
            StatusIcons::EXPORT,
            if options.dry_run { "Would copy" } else { "Copying" },
            candidates.len().to_string().bright_white(),
            options.dest.display()
        );
    }

    match copy_with_progress_bar(&candidates, &options, output).await {
        Ok(report) => show_copy_report(&report, output),
        Err(e) => {
            if let Some(report) = e.partial_report() {
                show_copy_report(report, output)?;
            }
            Err(e.into())
        }
    }
}

fn show_copy_report(report: &CopyReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Human => print_copy_report(report),
    }
    Ok(())
}

/// Run the copy executor behind an indicatif progress bar
pub async fn copy_with_progress_bar(
    candidates: &CandidateSet,
    options: &CopyOptions,
    output: OutputFormat,
) -> Result<CopyReport, CopyError> {
    let pb = if output == OutputFormat::Human {
        ProgressBar::new(candidates.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }

    let result = copy_roms(candidates, options, |p| {
        pb.set_position(p.completed as u64);
        pb.set_message(p.current.clone());
    })
    .await;

    pb.finish_and_clear();
    result
}

/// Print a human readable copy summary
pub fn print_copy_report(report: &CopyReport) {
    println!(
        "\n{} Copied {} games ({} total)",
        StatusIcons::SUCCESS.bright_green(),
        report.copied.len(),
        humansize::format_size(report.total_bytes, humansize::BINARY)
    );

    if !report.skipped.is_empty() {
        println!(
            "{} {} games had no ROM archive and were skipped:",
            StatusIcons::WARNING.yellow(),
            report.skipped.len()
        );
        for name in &report.skipped {
            println!("    {}", name);
        }
    }

    for failure in &report.failed {
        println!(
            "{} {}: {}",
            StatusIcons::ERROR.bright_red(),
            failure.name,
            failure.error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sources_prefers_command_line() {
        let mut config = Config::default();
        config.paths.xml = Some(PathBuf::from("config.xml"));
        config.paths.catver = Some(PathBuf::from("config.ini"));

        let args = CatalogArgs {
            xml: Some(PathBuf::from("cli.xml")),
            catver: None,
        };
        let (xml, catver) = resolve_sources(&args, &config).unwrap();
        assert_eq!(xml, PathBuf::from("cli.xml"));
        assert_eq!(catver, Some(PathBuf::from("config.ini")));
    }

    #[test]
    fn test_resolve_sources_requires_xml() {
        assert!(resolve_sources(&CatalogArgs::default(), &Config::default()).is_err());
    }
}
