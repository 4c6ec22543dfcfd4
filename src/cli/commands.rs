use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::app::state::{format_count, PageSizeTiers};
use crate::app::{App, AppState};
use crate::catalog::{Category, Hunt};
use crate::config::AppConfig;
use crate::engine::{self, FilterSnapshot, SortSpec};
use crate::presets::{FilterPreset, PresetStore};
use crate::ui::views::HuntDetail;

/// Category, tactic, tag and sort selections shared by `search` and `presets save`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only hunts in this category (Flames, Embers, Alchemy)
    #[arg(long)]
    pub category: Option<Category>,
    /// Require a tactic (repeatable; every tactic must match)
    #[arg(long = "tactic")]
    pub tactics: Vec<String>,
    /// Require a tag (repeatable; every tag must match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Sort order such as id-asc, title-desc or category-asc
    #[arg(long)]
    pub sort: Option<SortSpec>,
}

impl FilterArgs {
    fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            category: self.category,
            tactics: self.tactics.clone(),
            tags: self.tags.clone(),
            sort_by: self.sort,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Free-text query matched against title, notes, tactics, tags and submitter
    #[arg()]
    pub query: Vec<String>,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Page to print (clamped to the available pages)
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,
    /// Hunts per page (defaults to the widest viewport tier)
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Start from a saved or built-in preset
    #[arg(long)]
    pub preset: Option<String>,
    /// Plain title-first ranking over every hunt, ignoring other filters
    #[arg(long)]
    pub ranked: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Hunt identifier, e.g. H001
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PresetCommand {
    /// List built-in and saved presets
    List,
    /// Save the given filters under a label
    Save(PresetSaveArgs),
    /// Delete a saved preset
    Delete(PresetDeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PresetSaveArgs {
    /// Display label; the id is derived from it
    pub label: String,
    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PresetDeleteArgs {
    /// Preset identifier as printed by `presets list`
    pub id: String,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn search_hunts(
    config: &AppConfig,
    hunts: Vec<Hunt>,
    presets: &PresetStore,
    args: SearchArgs,
) -> Result<()> {
    let output = run_search(config, hunts, presets, &args)?;
    print!("{output}");
    Ok(())
}

fn run_search(
    config: &AppConfig,
    hunts: Vec<Hunt>,
    presets: &PresetStore,
    args: &SearchArgs,
) -> Result<String> {
    let query = args.query.join(" ");
    if args.ranked {
        let results = engine::search_ranked(&hunts, &query);
        return Ok(format_ranked(&query, &results, config.search.max_results));
    }

    let tiers = match args.page_size {
        Some(0) => bail!("page size must be at least 1"),
        Some(size) => PageSizeTiers::fixed(size),
        None => config.viewport.tiers(),
    };
    let mut state = AppState::new(hunts)
        .with_sort(config.default_sort)
        .with_page_size_tiers(tiers);

    if let Some(id) = &args.preset {
        let preset = presets
            .get(id)
            .with_context(|| format!("loading preset {id}"))?;
        state.apply_preset(&preset.filters);
    }
    if let Some(category) = args.filters.category {
        state.set_category(Some(category));
    }
    for tactic in &args.filters.tactics {
        if !state.selected_tactics().contains(tactic.trim()) {
            state.toggle_tactic(tactic);
        }
    }
    for tag in &args.filters.tags {
        if !state.selected_tags().contains(tag.trim()) {
            state.toggle_tag(tag);
        }
    }
    if let Some(sort) = args.filters.sort {
        state.set_sorting(sort.key, sort.direction);
    }
    state.set_search_query(&query);
    state.set_page(args.page);

    Ok(format_page(&state))
}

fn format_page(state: &AppState) -> String {
    let mut out = String::new();
    let window = state.page_window();
    if window.is_empty() {
        out.push_str("No hunts match these filters.\n");
    }
    for hunt in state.paginated_hunts() {
        let _ = writeln!(
            &mut out,
            "{:<6}{:<9}{}",
            hunt.id,
            hunt.category_label(),
            hunt.display_title()
        );
        let tactics: Vec<&str> = hunt.tactics().collect();
        if !tactics.is_empty() {
            let _ = writeln!(&mut out, "      tactics  {}", tactics.join(", "));
        }
        if !hunt.tags.is_empty() {
            let _ = writeln!(&mut out, "      tags     {}", format_tags(&hunt.tags));
        }
    }
    out.push('\n');
    let filters = state.active_filters();
    if !filters.is_empty() {
        let labels: Vec<String> = filters.iter().map(ToString::to_string).collect();
        let _ = writeln!(&mut out, "Filters: {}", labels.join(" • "));
    }
    let _ = writeln!(
        &mut out,
        "Page {} of {} • sort {}",
        window.current_page,
        window.total_pages,
        state.sort()
    );
    let _ = writeln!(&mut out, "{}", state.search_feedback());
    out
}

fn format_ranked(query: &str, results: &[&Hunt], limit: usize) -> String {
    let mut out = String::new();
    if results.is_empty() {
        let _ = writeln!(&mut out, "No hunts contain \"{}\".", query.trim());
        return out;
    }
    for hunt in results.iter().take(limit) {
        let _ = writeln!(&mut out, "{:<6}{}", hunt.id, hunt.display_title());
    }
    if results.len() > limit {
        let _ = writeln!(&mut out, "… {} more", format_count(results.len() - limit));
    }
    out
}

pub fn show_hunt(hunts: &[Hunt], args: ShowArgs) -> Result<()> {
    let output = run_show(hunts, &args.id)?;
    print!("{output}");
    Ok(())
}

fn run_show(hunts: &[Hunt], id: &str) -> Result<String> {
    let wanted = id.trim();
    let Some(hunt) = hunts.iter().find(|hunt| hunt.id.eq_ignore_ascii_case(wanted)) else {
        bail!("no hunt with id {wanted}");
    };
    Ok(format_detail(&HuntDetail::from_hunt(hunt)))
}

fn format_detail(detail: &HuntDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}  {}", detail.id, detail.title);
    match detail.hunt_style {
        Some(style) => {
            let _ = writeln!(&mut out, "Category:   {} ({style})", detail.category_label);
        }
        None => {
            let _ = writeln!(&mut out, "Category:   {}", detail.category_label);
        }
    }
    let _ = writeln!(&mut out, "Tactics:    {}", detail.tactics.join(", "));
    let _ = writeln!(&mut out, "Tags:       {}", format_tags(&detail.tags));
    let submitter = if detail.submitter.is_empty() {
        "unknown"
    } else {
        detail.submitter.as_str()
    };
    match &detail.submitter_link {
        Some(link) => {
            let _ = writeln!(&mut out, "Submitter:  {submitter} <{link}>");
        }
        None => {
            let _ = writeln!(&mut out, "Submitter:  {submitter}");
        }
    }
    if !detail.file_path.is_empty() {
        let _ = writeln!(&mut out, "Source:     {}", detail.file_path);
    }
    let sections = [
        ("Hypothesis", detail.notes.lines().map(str::to_string).collect::<Vec<_>>()),
        ("Why", detail.why.clone()),
        ("References", detail.references.clone()),
    ];
    for (heading, lines) in sections {
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(&mut out, "\n{heading}");
        for line in lines {
            let _ = writeln!(&mut out, "  {line}");
        }
    }
    out
}

pub fn print_stats(hunts: Vec<Hunt>) -> Result<()> {
    print!("{}", run_stats(hunts));
    Ok(())
}

fn run_stats(hunts: Vec<Hunt>) -> String {
    let state = AppState::new(hunts);
    let summary = state.summary();
    let mut out = String::new();
    let _ = writeln!(&mut out, "Hunts:         {}", format_count(summary.total_hunts));
    let _ = writeln!(&mut out, "Tactics:       {}", format_count(summary.unique_tactics));
    let _ = writeln!(
        &mut out,
        "Contributors:  {}",
        format_count(summary.unique_contributors)
    );
    let _ = writeln!(&mut out, "Tags:          {}", format_count(state.unique_tags().len()));
    for (group, tactics) in state.tactic_groups() {
        let _ = writeln!(&mut out, "\n{group}");
        for tactic in tactics {
            let _ = writeln!(&mut out, "  {tactic}");
        }
    }
    out
}

pub fn handle_preset_command(presets: &PresetStore, args: PresetArgs) -> Result<()> {
    let output = match args.command {
        PresetCommand::List => {
            let all = presets.all().context("listing presets")?;
            format_presets(&all)
        }
        PresetCommand::Save(args) => {
            let preset = presets
                .save(&args.label, &args.filters.snapshot())
                .context("saving preset")?;
            format!("Saved preset {} ({})\n", preset.id, describe_filters(&preset.filters))
        }
        PresetCommand::Delete(args) => {
            presets
                .delete(args.id.trim())
                .with_context(|| format!("deleting preset {}", args.id.trim()))?;
            format!("Deleted preset {}\n", args.id.trim())
        }
    };
    print!("{output}");
    Ok(())
}

fn format_presets(presets: &[FilterPreset]) -> String {
    let mut out = String::new();
    for preset in presets {
        let marker = if preset.built_in { "  [built-in]" } else { "" };
        let _ = writeln!(&mut out, "{:<18}{}{marker}", preset.id, preset.label);
        let _ = writeln!(&mut out, "    {}", describe_filters(&preset.filters));
    }
    out
}

fn describe_filters(filters: &FilterSnapshot) -> String {
    let mut parts = Vec::new();
    if let Some(category) = filters.category {
        parts.push(format!("category {category}"));
    }
    if !filters.tactics.is_empty() {
        parts.push(format!("tactics {}", filters.tactics.join(", ")));
    }
    if !filters.tags.is_empty() {
        parts.push(format!("tags {}", format_tags(&filters.tags)));
    }
    if let Some(sort) = filters.sort_by {
        parts.push(format!("sort {sort}"));
    }
    if parts.is_empty() {
        "no filters".to_string()
    } else {
        parts.join("; ")
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}
