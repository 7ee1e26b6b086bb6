//! Interactive Mode - Guided filtering session
//!
//! Prompts for the catalog files, lets the user tick facet values, shows the
//! live match count after every change and finally copies the archives.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::commands::{copy_with_progress_bar, print_copy_report};
use crate::cli::{InteractiveArgs, OutputFormat};
use crate::config::Config;
use crate::core::{CandidateSet, Catalog, Facet, FilterSelection};
use crate::StatusIcons;

/// Facets offered as checkbox lists; buttons use the max-buttons range instead
const CHECKBOX_FACETS: [Facet; 7] = [
    Facet::ControlType,
    Facet::Ways,
    Facet::Players,
    Facet::Status,
    Facet::Emulation,
    Facet::Savestate,
    Facet::Category,
];

/// Run interactive session
pub async fn run_interactive_session(args: &InteractiveArgs, config: &Config) -> Result<()> {
    let term = Term::stdout();
    term.clear_screen()?;

    print_interactive_banner();

    let mut session = InteractiveSession::new(args, config);

    loop {
        match session.state {
            SessionState::SelectFiles => session.select_files()?,
            SessionState::Loading => session.load_catalog(),
            SessionState::Filter => session.filter_menu()?,
            SessionState::Copy => session.copy_files().await?,
            SessionState::Exit => break,
        }
    }

    println!(
        "\n{} {}\n",
        "Thanks for using ROM Filter!".bright_cyan(),
        StatusIcons::JOYSTICK
    );
    Ok(())
}

fn print_interactive_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║  🕹  ROM FILTER - Interactive Mode                                            ║
║                                                                              ║
║  Pick a filter to change it, every value starts out included.                ║
║  [Space] Toggle  [Enter] Confirm  [Esc] Back                                 ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;
    println!("{}", banner.bright_cyan());
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionState {
    SelectFiles,
    Loading,
    Filter,
    Copy,
    Exit,
}

struct InteractiveSession {
    state: SessionState,
    config: Config,
    xml: Option<PathBuf>,
    catver: Option<PathBuf>,
    catalog: Option<Catalog>,
    selection: FilterSelection,
    candidates: CandidateSet,
}

impl InteractiveSession {
    fn new(args: &InteractiveArgs, config: &Config) -> Self {
        let xml = args.catalog.xml.clone().or_else(|| config.paths.xml.clone());
        let catver = args
            .catalog
            .catver
            .clone()
            .or_else(|| config.paths.catver.clone());

        Self {
            state: if xml.is_some() {
                SessionState::Loading
            } else {
                SessionState::SelectFiles
            },
            config: config.clone(),
            xml,
            catver,
            catalog: None,
            selection: config.filter.to_selection(),
            candidates: CandidateSet::new(),
        }
    }

    fn select_files(&mut self) -> Result<()> {
        println!("\n{}\n", "Select the data files:".bright_yellow());

        let xml: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("mameXXX.xml")
            .with_initial_text(path_text(&self.xml))
            .interact_text()?;

        let catver: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("catver.ini (optional)")
            .allow_empty(true)
            .with_initial_text(path_text(&self.catver))
            .interact_text()?;

        self.xml = Some(PathBuf::from(xml.trim()));
        self.catver = Some(catver.trim())
            .filter(|c| !c.is_empty())
            .map(PathBuf::from);
        self.state = SessionState::Loading;
        Ok(())
    }

    fn load_catalog(&mut self) {
        let Some(xml) = self.xml.clone() else {
            self.state = SessionState::SelectFiles;
            return;
        };

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb.set_message(format!("Reading {}", xml.display()));

        match Catalog::load(&xml, self.catver.as_deref()) {
            Ok(catalog) => {
                pb.finish_with_message(format!(
                    "{} Loaded {} games ({} data warnings)",
                    StatusIcons::SUCCESS.bright_green(),
                    catalog.all_games().len().to_string().bright_white(),
                    catalog.warnings().len()
                ));
                self.candidates = catalog.recompute(&self.selection);
                self.catalog = Some(catalog);
                self.state = SessionState::Filter;
            }
            Err(e) => {
                // Back to the file prompt so the user can fix the path
                pb.finish_and_clear();
                println!("{} {}", StatusIcons::ERROR.bright_red(), e);
                self.state = SessionState::SelectFiles;
            }
        }
    }

    fn recompute(&mut self) {
        if let Some(catalog) = &self.catalog {
            self.candidates = catalog.recompute(&self.selection);
        }
    }

    fn filter_menu(&mut self) -> Result<()> {
        let Some(catalog) = &self.catalog else {
            self.state = SessionState::SelectFiles;
            return Ok(());
        };

        let mut items: Vec<String> = CHECKBOX_FACETS
            .iter()
            .map(|&facet| {
                let known = catalog.index(facet).len();
                let included = self
                    .selection
                    .include
                    .get(&facet)
                    .map_or(known, |values| values.len());
                format!("{} ({}/{} included)", facet.title(), included, known)
            })
            .collect();
        items.push(format!(
            "Max buttons: {}",
            self.selection
                .max_buttons
                .map_or_else(|| "any".to_string(), |n| n.to_string())
        ));
        items.push(format!(
            "Include clones: {}",
            if self.selection.exclude_clones { "no" } else { "yes" }
        ));
        items.push("Show matching games".to_string());
        items.push(format!("Copy {} games", self.candidates.len()));
        items.push("Exit".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "{} of {} games match",
                self.candidates.len(),
                catalog.all_games().len()
            ))
            .items(&items)
            .default(0)
            .interact_opt()?;

        let facet_count = CHECKBOX_FACETS.len();
        match selection {
            Some(idx) if idx < facet_count => self.edit_facet(CHECKBOX_FACETS[idx])?,
            Some(idx) if idx == facet_count => self.edit_max_buttons()?,
            Some(idx) if idx == facet_count + 1 => {
                self.selection.exclude_clones = !Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Include clones?")
                    .default(!self.selection.exclude_clones)
                    .interact()?;
                self.recompute();
            }
            Some(idx) if idx == facet_count + 2 => self.show_matches()?,
            Some(idx) if idx == facet_count + 3 => {
                if self.candidates.is_empty() {
                    println!("{}", "No games match the current filters!".yellow());
                } else {
                    self.state = SessionState::Copy;
                }
            }
            _ => self.state = SessionState::Exit,
        }

        Ok(())
    }

    fn edit_facet(&mut self, facet: Facet) -> Result<()> {
        let Some(catalog) = &self.catalog else {
            return Ok(());
        };

        let values = catalog.facet_values(facet);
        if values.is_empty() {
            println!("{} No {} data in this catalog", StatusIcons::INFO, facet.title());
            return Ok(());
        }

        let current = self.selection.include.get(&facet);
        let checked: Vec<bool> = values
            .iter()
            .map(|(value, _)| current.map_or(true, |included| included.contains(value)))
            .collect();
        let labels: Vec<String> = values
            .iter()
            .map(|(value, count)| format!("{} ({})", value, count))
            .collect();

        let picked = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} (Space to toggle, Enter to confirm)", facet.title()))
            .items(&labels)
            .defaults(&checked)
            .interact_opt()?;

        let Some(picked) = picked else {
            return Ok(());
        };

        if picked.is_empty() {
            println!(
                "{}",
                "Nothing ticked, this filter will include everything.".yellow()
            );
        }

        if picked.len() == values.len() {
            self.selection.include.remove(&facet);
        } else {
            self.selection
                .set_included(facet, picked.into_iter().map(|i| values[i].0.clone()));
        }
        self.recompute();
        Ok(())
    }

    fn edit_max_buttons(&mut self) -> Result<()> {
        let current = self
            .selection
            .max_buttons
            .map(|n| n.to_string())
            .unwrap_or_default();

        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Maximum buttons (empty for any)")
            .allow_empty(true)
            .with_initial_text(current)
            .validate_with(|text: &String| -> Result<(), String> {
                if text.trim().is_empty() || text.trim().parse::<u32>().is_ok() {
                    Ok(())
                } else {
                    Err("Enter a whole number".to_string())
                }
            })
            .interact_text()?;

        self.selection.max_buttons = input.trim().parse().ok();
        self.recompute();
        Ok(())
    }

    fn show_matches(&self) -> Result<()> {
        if self.candidates.is_empty() {
            println!("{}", "No games match.".yellow());
            return Ok(());
        }

        let names: Vec<&str> = self.candidates.iter().map(String::as_str).collect();
        let picked = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} matching games (type to search)", names.len()))
            .items(&names)
            .default(0)
            .interact_opt()?;

        if let (Some(idx), Some(catalog)) = (picked, &self.catalog) {
            if let Some(record) = catalog.record(names[idx]) {
                println!("\n{}", record.name.bright_white().bold());
                println!("  clone of:  {}", record.clone_of.as_deref().unwrap_or("-"));
                println!("  players:   {}", record.players.as_deref().unwrap_or("-"));
                println!("  controls:  {}", record.control_type.as_deref().unwrap_or("-"));
                println!("  buttons:   {}", record.button_count.as_deref().unwrap_or("-"));
                println!("  emulation: {}", record.emulation().unwrap_or("-"));
                if !record.categories.is_empty() {
                    let categories: Vec<&str> =
                        record.categories.iter().map(String::as_str).collect();
                    println!("  category:  {}", categories.join(", "));
                }
                println!();
            }
        }

        Ok(())
    }

    async fn copy_files(&mut self) -> Result<()> {
        println!(
            "\n{} Copy {} games\n",
            StatusIcons::EXPORT.bright_yellow(),
            self.candidates.len()
        );

        let source: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("ROM folder")
            .with_initial_text(path_text(&self.config.paths.roms_source))
            .interact_text()?;

        let source = PathBuf::from(source.trim());
        if !source.is_dir() {
            println!(
                "{} Not a directory: {}",
                StatusIcons::ERROR.bright_red(),
                source.display()
            );
            self.state = SessionState::Filter;
            return Ok(());
        }

        let dest: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Destination folder")
            .with_initial_text(path_text(&self.config.paths.roms_dest))
            .interact_text()?;

        let verify = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Verify copies with blake3 hash?")
            .default(self.config.copy.verify_hash)
            .interact()?;

        let mut options = self
            .config
            .copy
            .to_options(source, PathBuf::from(dest.trim()));
        options.verify_hash = verify;

        match copy_with_progress_bar(&self.candidates, &options, OutputFormat::Human).await {
            Ok(report) => print_copy_report(&report),
            Err(e) => {
                if let Some(report) = e.partial_report() {
                    print_copy_report(report);
                }
                println!("{} {}", StatusIcons::ERROR.bright_red(), e);
            }
        }

        self.state = SessionState::Filter;
        Ok(())
    }
}

fn path_text(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
