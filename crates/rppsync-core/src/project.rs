use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    compare::{CompareOptions, DiffReport, compare_with},
    copy::{CopySelection, copy_track},
    extract::{MASTER_LAYOUT, extract, extract_chain, extract_master},
    model::{DEFAULT_TEMPO, ProjectInfo, TRACK_TAG, TrackInfo, TrackRef},
    node::{Document, Node, ParseError},
};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to parse project: {0}")]
    Parse(#[from] ParseError),
    #[error("track not found: {0}")]
    TrackNotFound(TrackRef),
    #[error("no track matches `{0}`")]
    UnknownSelector(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    document: Document,
}

impl Project {
    #[instrument(skip(text), fields(bytes = text.len()))]
    pub fn parse(text: &str) -> Result<Self, ProjectError> {
        let project = Self::from_document(Document::parse(text)?);
        info!(tracks = project.track_count(), "project parsed");
        Ok(project)
    }

    #[must_use]
    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn to_rpp_string(&self) -> String {
        self.document.render()
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.track_nodes().count()
    }

    #[must_use]
    pub fn info(&self) -> ProjectInfo {
        let root = self.document.root();
        let track_count = self.track_count();
        ProjectInfo {
            version: root.param(0).unwrap_or_default().to_string(),
            app_version: root.param(1).unwrap_or_default().to_string(),
            timestamp: root.param_i64(2),
            track_count,
            total_track_count: track_count + 1,
            has_master_effects: root
                .child(MASTER_LAYOUT.chain_tag)
                .is_some_and(|chain| !extract_chain(chain).0.is_empty()),
            tempo: root
                .child("TEMPO")
                .and_then(|line| line.param_f64(0))
                .unwrap_or(DEFAULT_TEMPO),
        }
    }

    #[must_use]
    pub fn tracks(&self) -> Vec<(TrackRef, TrackInfo)> {
        std::iter::once((TrackRef::Master, extract_master(self.document.root())))
            .chain(
                self.track_nodes()
                    .enumerate()
                    .map(|(index, node)| (TrackRef::Track(index), extract(node))),
            )
            .collect()
    }

    #[must_use]
    pub fn track(&self, track: TrackRef) -> Option<TrackInfo> {
        self.track_node(track).map(extract)
    }

    #[must_use]
    pub fn track_node(&self, track: TrackRef) -> Option<&Node> {
        match track {
            TrackRef::Master => Some(self.document.root()),
            TrackRef::Track(index) => self.track_nodes().nth(index),
        }
    }

    fn track_node_mut(&mut self, track: TrackRef) -> Option<&mut Node> {
        let root = self.document.root_mut();
        match track {
            TrackRef::Master => Some(root),
            TrackRef::Track(index) => root
                .children_mut()
                .iter_mut()
                .filter(|child| is_track_block(child))
                .nth(index),
        }
    }

    fn track_nodes(&self) -> impl Iterator<Item = &Node> {
        self.document
            .root()
            .children()
            .iter()
            .filter(|child| is_track_block(child))
    }

    #[must_use]
    pub fn track_by_name(&self, name: &str) -> Option<(TrackRef, TrackInfo)> {
        self.tracks().into_iter().find(|(_, track)| track.name == name)
    }

    #[must_use]
    pub fn track_by_id(&self, track_id: &str) -> Option<(TrackRef, TrackInfo)> {
        self.tracks()
            .into_iter()
            .find(|(_, track)| track.track_id.eq_ignore_ascii_case(track_id))
    }

    /// Resolves `master`, `#<index>`, a track GUID or an exact track name.
    pub fn resolve(&self, selector: &str) -> Result<TrackRef, ProjectError> {
        let selector = selector.trim();
        if selector.eq_ignore_ascii_case("master") {
            return Ok(TrackRef::Master);
        }
        if let Some(index) = selector
            .strip_prefix('#')
            .and_then(|digits| digits.parse::<usize>().ok())
        {
            let track = TrackRef::Track(index);
            return self
                .track_node(track)
                .map(|_| track)
                .ok_or(ProjectError::TrackNotFound(track));
        }

        self.track_by_id(selector)
            .or_else(|| self.track_by_name(selector))
            .map(|(track, _)| track)
            .ok_or_else(|| {
                debug!(selector, "selector matched no track");
                ProjectError::UnknownSelector(selector.to_string())
            })
    }

    #[instrument(skip(self, source), fields(source = %source.name, %dest, %selection))]
    pub fn copy_into(
        &mut self,
        source: &TrackInfo,
        dest: TrackRef,
        selection: &CopySelection,
    ) -> Result<TrackInfo, ProjectError> {
        let node = self
            .track_node_mut(dest)
            .ok_or(ProjectError::TrackNotFound(dest))?;
        if selection.is_empty() {
            warn!("empty copy selection");
        }
        copy_track(source, node, selection);
        Ok(extract(node))
    }
}

fn is_track_block(node: &Node) -> bool {
    node.is_block() && node.tag() == TRACK_TAG
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMatch {
    pub left: TrackRef,
    pub right: Option<TrackRef>,
    pub name: String,
    pub report: Option<DiffReport>,
}

impl TrackMatch {
    #[must_use]
    pub fn differs(&self) -> bool {
        self.report.as_ref().is_none_or(|report| !report.is_empty())
    }
}

#[instrument(skip_all)]
#[must_use]
pub fn compare_projects(
    left: &Project,
    right: &Project,
    options: &CompareOptions,
) -> Vec<TrackMatch> {
    let right_tracks = right.tracks();
    let mut used = vec![false; right_tracks.len()];

    let matches: Vec<TrackMatch> = left
        .tracks()
        .into_iter()
        .map(|(left_ref, left_track)| {
            let counterpart = right_tracks
                .iter()
                .enumerate()
                .position(|(index, (_, track))| {
                    !used[index]
                        && track.is_master == left_track.is_master
                        && track.name == left_track.name
                });
            let (right_ref, report) = match counterpart {
                Some(index) => {
                    used[index] = true;
                    let (right_ref, right_track) = &right_tracks[index];
                    (
                        Some(*right_ref),
                        Some(compare_with(&left_track, right_track, options)),
                    )
                }
                None => (None, None),
            };
            TrackMatch {
                left: left_ref,
                right: right_ref,
                name: left_track.name,
                report,
            }
        })
        .collect();

    info!(
        tracks = matches.len(),
        differing = matches.iter().filter(|pair| pair.differs()).count(),
        "projects compared"
    );
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "<REAPER_PROJECT 0.1 \"7.0/linux-x86_64\" 1700000000\n  TEMPO 98 4 4\n  MASTER_VOLUME 1 0 -1 -1 1\n  <TRACK {AAA}\n    NAME Drums\n    VOLPAN 0.5 0 -1 -1 1\n  >\n  <TRACK {BBB}\n    NAME Bass\n  >\n>\n";

    #[test]
    fn info_reads_root_header_and_tempo() {
        let project = Project::parse(SMALL).expect("project should parse");
        let info = project.info();
        assert_eq!(info.version, "0.1");
        assert_eq!(info.app_version, "7.0/linux-x86_64");
        assert_eq!(info.timestamp, Some(1_700_000_000));
        assert_eq!(info.track_count, 2);
        assert_eq!(info.total_track_count, 3);
        assert!(!info.has_master_effects);
        assert!((info.tempo - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn selectors_resolve_in_order() {
        let project = Project::parse(SMALL).expect("project should parse");
        assert_eq!(project.resolve("MASTER").expect("master"), TrackRef::Master);
        assert_eq!(project.resolve("#1").expect("index"), TrackRef::Track(1));
        assert_eq!(project.resolve("{aaa}").expect("guid"), TrackRef::Track(0));
        assert_eq!(project.resolve("Bass").expect("name"), TrackRef::Track(1));
        assert!(matches!(
            project.resolve("#7"),
            Err(ProjectError::TrackNotFound(TrackRef::Track(7)))
        ));
        assert!(matches!(
            project.resolve("Keys"),
            Err(ProjectError::UnknownSelector(selector)) if selector == "Keys"
        ));
    }

    #[test]
    fn tracks_start_with_master() {
        let project = Project::parse(SMALL).expect("project should parse");
        let names: Vec<String> = project
            .tracks()
            .into_iter()
            .map(|(_, track)| track.name)
            .collect();
        assert_eq!(names, vec!["Master", "Drums", "Bass"]);
    }

    #[test]
    fn copy_into_missing_track_fails() {
        let mut project = Project::parse(SMALL).expect("project should parse");
        let source = project.track(TrackRef::Track(0)).expect("drums");
        let result = project.copy_into(&source, TrackRef::Track(9), &CopySelection::all());
        assert!(matches!(
            result,
            Err(ProjectError::TrackNotFound(TrackRef::Track(9)))
        ));
    }
}
