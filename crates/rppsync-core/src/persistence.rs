use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::project::Project;

#[instrument(skip(project), fields(path = %path.display()))]
pub fn save_project(path: &Path, project: &Project) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let text = project.to_rpp_string();
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .context("failed to create temp project file")?;
    temp_file
        .write_all(text.as_bytes())
        .context("failed to write temp project file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist project: {}", path.display()))?;

    info!(bytes = text.len(), "project saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read project: {}", path.display()))?;
    let project = Project::parse(&text)
        .with_context(|| format!("invalid project file: {}", path.display()))?;
    info!(tracks = project.track_count(), "project loaded");
    Ok(project)
}
