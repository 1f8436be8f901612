use std::path::Path;

use anyhow::{Context, Result};
use rppsync_core::{
    CompareOptions, CopySelection, DiffReport, Project, ProjectInfo, TrackInfo, TrackMatch,
    TrackRef, compare_projects, compare_with,
    fixtures::{SESSION_A_RPP, SESSION_B_RPP},
    persistence::{load_project, save_project},
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::OutputFormat;

#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub compare: CompareOptions,
    pub default_selection: CopySelection,
}

#[derive(Debug, Serialize)]
struct TrackListing {
    info: ProjectInfo,
    tracks: Vec<TrackEntry>,
}

#[derive(Debug, Serialize)]
struct TrackEntry {
    reference: TrackRef,
    #[serde(flatten)]
    track: TrackInfo,
}

#[derive(Debug, Serialize)]
struct CopyOutcome {
    destination: TrackRef,
    output: String,
    track: TrackInfo,
    remaining: DiffReport,
}

fn render<T: Serialize>(
    context: &CommandContext,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String> {
    match context.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("failed to serialize command output")
        }
        OutputFormat::Text => Ok(text(value)),
    }
}

fn track_line(reference: TrackRef, track: &TrackInfo) -> String {
    let effects = if track.effects.is_empty() {
        "none".to_string()
    } else {
        track.effect_names().join(", ")
    };
    let reference = reference.to_string();
    let mut flags = String::new();
    if track.mute {
        flags.push_str(" [muted]");
    }
    if track.solo {
        flags.push_str(" [solo]");
    }
    format!(
        "{reference:>6}  {track}{flags}\n        effects: {effects}\n        envelopes: {}",
        track.envelope_summary()
    )
}

fn report_text(report: &DiffReport) -> String {
    if report.is_empty() {
        return "  no differences".to_string();
    }
    report
        .iter()
        .map(|entry| format!("  {entry}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[instrument(skip(context), fields(path = %path.display()))]
pub fn tracks(context: &CommandContext, path: &Path) -> Result<String> {
    let project = load_project(path)?;
    let listing = TrackListing {
        info: project.info(),
        tracks: project
            .tracks()
            .into_iter()
            .map(|(reference, track)| TrackEntry { reference, track })
            .collect(),
    };

    render(context, &listing, |listing| {
        let info = &listing.info;
        let mut out = format!(
            "{} (REAPER {}, {} tracks + master, {} BPM)\n",
            path.display(),
            info.app_version,
            info.track_count,
            info.tempo
        );
        for entry in &listing.tracks {
            out.push_str(&track_line(entry.reference, &entry.track));
            out.push('\n');
        }
        out
    })
}

#[instrument(skip(context), fields(left = %left_path.display(), right = %right_path.display()))]
pub fn diff(
    context: &CommandContext,
    left_path: &Path,
    right_path: &Path,
    left_selector: Option<&str>,
    right_selector: Option<&str>,
) -> Result<String> {
    let left = load_project(left_path)?;
    let right = load_project(right_path)?;

    let Some(left_selector) = left_selector.or(right_selector) else {
        let matches = compare_projects(&left, &right, &context.compare);
        return render(context, &matches, |matches| project_diff_text(matches));
    };
    let right_selector = right_selector.unwrap_or(left_selector);

    let left_track = resolve_track(&left, left_selector, left_path)?;
    let right_track = resolve_track(&right, right_selector, right_path)?;
    let report = compare_with(&left_track, &right_track, &context.compare);
    info!(entries = report.len(), "tracks compared");

    render(context, &report, |report| {
        format!("{left_track}\n  vs {right_track}\n{}", report_text(report))
    })
}

fn project_diff_text(matches: &[TrackMatch]) -> String {
    let mut out = String::new();
    for pair in matches {
        match (&pair.right, &pair.report) {
            (Some(right), Some(report)) => {
                out.push_str(&format!(
                    "{} '{}' <-> {right}\n{}\n",
                    pair.left,
                    pair.name,
                    report_text(report)
                ));
            }
            _ => {
                out.push_str(&format!("{} '{}' has no counterpart\n", pair.left, pair.name));
            }
        }
    }
    out
}

fn resolve_track(project: &Project, selector: &str, path: &Path) -> Result<TrackInfo> {
    let reference = project
        .resolve(selector)
        .with_context(|| format!("in {}", path.display()))?;
    project
        .track(reference)
        .with_context(|| format!("track {reference} vanished from {}", path.display()))
}

#[instrument(skip(context, selection), fields(from = %from.display(), to = %to.display()))]
pub fn copy(
    context: &CommandContext,
    from: &Path,
    to: &Path,
    source_selector: &str,
    dest_selector: &str,
    selection: Option<&CopySelection>,
    output: Option<&Path>,
) -> Result<String> {
    let source_project = load_project(from)?;
    let source = resolve_track(&source_project, source_selector, from)?;

    let mut dest_project = load_project(to)?;
    let destination = dest_project
        .resolve(dest_selector)
        .with_context(|| format!("in {}", to.display()))?;
    let selection = selection.unwrap_or(&context.default_selection);

    let track = dest_project.copy_into(&source, destination, selection)?;
    let output = output.unwrap_or(to);
    save_project(output, &dest_project)?;

    let outcome = CopyOutcome {
        destination,
        output: output.display().to_string(),
        remaining: compare_with(&source, &track, &context.compare),
        track,
    };
    render(context, &outcome, |outcome| {
        format!(
            "copied {selection} from {source}\n  into {} ({})\n  saved to {}\nremaining differences:\n{}",
            outcome.track,
            outcome.destination,
            outcome.output,
            report_text(&outcome.remaining)
        )
    })
}

#[instrument(skip(context), fields(dir = %dir.display()))]
pub fn demo(context: &CommandContext, dir: &Path) -> Result<String> {
    let mut written = Vec::new();
    for (name, text) in [
        ("session_a.rpp", SESSION_A_RPP),
        ("session_b.rpp", SESSION_B_RPP),
    ] {
        let path = dir.join(name);
        let project = Project::parse(text).context("demo fixture failed to parse")?;
        save_project(&path, &project)?;
        written.push(path.display().to_string());
    }
    info!(files = written.len(), "demo projects written");

    render(context, &written, |written| written.join("\n"))
}
