use std::{cmp::Reverse, collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    extract::{RoleLayout, SETTINGS_DEFAULTS, layout_for, plugin_signature, scan_chain},
    model::{EnvelopeKind, TRACK_TAG, TrackInfo, TrackRole},
    node::Node,
};

const ITEM_TAG: &str = "ITEM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyField {
    Volume,
    Pan,
    Effects,
    Envelopes,
}

impl CopyField {
    pub const ALL: [Self; 4] = [Self::Volume, Self::Pan, Self::Effects, Self::Envelopes];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Pan => "pan",
            Self::Effects => "effects",
            Self::Envelopes => "envelopes",
        }
    }
}

impl fmt::Display for CopyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown copy field `{0}` (expected volume, pan, effects or envelopes)")]
pub struct UnknownCopyField(pub String);

impl FromStr for CopyField {
    type Err = UnknownCopyField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownCopyField(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CopySelection(BTreeSet<CopyField>);

impl CopySelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all() -> Self {
        CopyField::ALL.into_iter().collect()
    }

    #[must_use]
    pub fn with(mut self, field: CopyField) -> Self {
        self.0.insert(field);
        self
    }

    #[must_use]
    pub fn contains(&self, field: CopyField) -> bool {
        self.0.contains(&field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CopyField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<CopyField> for CopySelection {
    fn from_iter<I: IntoIterator<Item = CopyField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CopySelection {
    type Err = UnknownCopyField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<CopyField>)
            .collect()
    }
}

impl fmt::Display for CopySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.iter().map(CopyField::as_str).collect();
        f.write_str(&fields.join(","))
    }
}

pub fn copy_track(source: &TrackInfo, dest: &mut Node, selection: &CopySelection) {
    let layout = layout_for(TrackRole::of(dest));

    if selection.contains(CopyField::Volume) || selection.contains(CopyField::Pan) {
        copy_settings(source, dest, layout, selection);
    }
    if selection.contains(CopyField::Effects) {
        copy_effects(source, dest, layout);
    }
    if selection.contains(CopyField::Envelopes) {
        copy_envelope(source, dest, layout, EnvelopeKind::Volume);
        copy_envelope(source, dest, layout, EnvelopeKind::Pan);
        if !selection.contains(CopyField::Effects) {
            copy_parameter_envelopes(source, dest, layout);
        }
    }

    info!(
        source = %source.name,
        source_role = ?source.role(),
        dest_role = ?layout.role,
        %selection,
        "track settings copied"
    );
}

fn copy_settings(
    source: &TrackInfo,
    dest: &mut Node,
    layout: &RoleLayout,
    selection: &CopySelection,
) {
    let index = match dest.child_index(layout.settings_tag) {
        Some(index) => index,
        None => {
            let index = settings_insert_index(dest, layout);
            dest.children_mut()
                .insert(index, Node::line(layout.settings_tag, SETTINGS_DEFAULTS));
            debug!(tag = layout.settings_tag, index, "synthesized settings line");
            index
        }
    };

    let line = &mut dest.children_mut()[index];
    line.pad_params(&SETTINGS_DEFAULTS);
    if selection.contains(CopyField::Volume) {
        set_number(line, 0, source.volume);
    }
    if selection.contains(CopyField::Pan) {
        set_number(line, 1, source.pan);
    }
}

/// Writes `value` unless the parameter already holds exactly that number, so an equal value
/// keeps its original spelling.
#[allow(clippy::float_cmp)]
fn set_number(line: &mut Node, index: usize, value: f64) {
    if line.param_f64(index) == Some(value) {
        return;
    }
    line.set_param(index, format!("{value}"));
}

fn copy_effects(source: &TrackInfo, dest: &mut Node, layout: &RoleLayout) {
    let slots: Vec<Node> = source
        .effects
        .iter()
        .flat_map(|effect| effect.slot.iter().cloned())
        .collect();

    match dest.child_index(layout.chain_tag) {
        Some(index) => {
            let chain = &mut dest.children_mut()[index];
            let first_slot = scan_chain(chain).first_slot;
            let children = chain.children_mut();
            children.truncate(first_slot);
            clamp_selection_lines(children, source.effects.len());
            children.extend(slots);
            debug!(
                tag = layout.chain_tag,
                effects = source.effects.len(),
                "effect chain replaced"
            );
        }
        None if slots.is_empty() => {
            debug!("source has no effects and destination has no chain; nothing to copy");
        }
        None => {
            let index = chain_insert_index(dest, layout);
            let chain = Node::block(layout.chain_tag, Vec::<String>::new())
                .with_children(default_chain_header().into_iter().chain(slots));
            dest.children_mut().insert(index, chain);
            info!(tag = layout.chain_tag, index, "created missing effect chain");
        }
    }
}

/// `SHOW` and `LASTSEL` index into the chain; reset them once they point past its end.
fn clamp_selection_lines(header: &mut [Node], effects: usize) {
    for line in header
        .iter_mut()
        .filter(|node| !node.is_block() && matches!(node.tag(), "SHOW" | "LASTSEL"))
    {
        let limit = if line.tag() == "SHOW" {
            effects
        } else {
            effects.saturating_sub(1)
        };
        let points_past = line
            .param(0)
            .and_then(|value| value.parse::<usize>().ok())
            .is_some_and(|value| value > limit);
        if points_past {
            line.set_param(0, "0");
        }
    }
}

fn default_chain_header() -> [Node; 4] {
    [
        Node::line("WNDRECT", ["24", "52", "655", "408"]),
        Node::line("SHOW", ["0"]),
        Node::line("LASTSEL", ["0"]),
        Node::line("DOCKED", ["0"]),
    ]
}

fn copy_envelope(source: &TrackInfo, dest: &mut Node, layout: &RoleLayout, kind: EnvelopeKind) {
    let (tag, envelope) = match kind {
        EnvelopeKind::Volume => (layout.volume_envelope_tag, source.volume_envelope.as_ref()),
        EnvelopeKind::Pan => (layout.pan_envelope_tag, source.pan_envelope.as_ref()),
        EnvelopeKind::Parameter => return,
    };

    let replacement = envelope.map(|envelope| {
        let mut node = envelope.node.clone();
        node.set_tag(tag);
        node
    });

    match (dest.child_index(tag), replacement) {
        (Some(index), Some(node)) => dest.children_mut()[index] = node,
        (Some(index), None) => {
            dest.children_mut().remove(index);
            debug!(tag, "removed envelope absent from source");
        }
        (None, Some(node)) => {
            let index = envelope_insert_index(dest, layout, kind);
            dest.children_mut().insert(index, node);
            debug!(tag, index, "inserted envelope");
        }
        (None, None) => {}
    }
}

fn copy_parameter_envelopes(source: &TrackInfo, dest: &mut Node, layout: &RoleLayout) {
    let Some(chain) = dest.child_mut(layout.chain_tag) else {
        if !source.parameter_envelopes.is_empty() {
            warn!(
                envelopes = source.parameter_envelopes.len(),
                "destination has no effect chain; parameter envelopes not copied"
            );
        }
        return;
    };

    let scan = scan_chain(chain);
    let mut used = vec![false; scan.slots.len()];
    let mut replacements = Vec::new();

    for effect in &source.effects {
        let signature = effect.signature();
        let matched = scan.slots.iter().enumerate().position(|(i, span)| {
            !used[i]
                && span
                    .plugin
                    .is_some_and(|plugin| plugin_signature(&chain.children()[plugin]) == signature)
        });
        let Some(slot_index) = matched else {
            if effect.slot.iter().any(|node| node.tag() == "PARMENV") {
                warn!(
                    effect = %effect.name,
                    "no matching destination effect for parameter envelopes"
                );
            }
            continue;
        };
        used[slot_index] = true;

        let span = scan.slots[slot_index];
        let current = &chain.children()[span.start..span.end];
        let envelopes: Vec<Node> = effect
            .slot
            .iter()
            .filter(|node| node.tag() == "PARMENV")
            .cloned()
            .collect();
        replacements.push((span.start, span.end, merge_slot_envelopes(current, envelopes)));
    }

    // Splice from the back so earlier spans keep their indices.
    replacements.sort_by_key(|(start, ..)| Reverse(*start));
    for (start, end, nodes) in replacements {
        chain.children_mut().splice(start..end, nodes);
    }
}

/// Drops a slot's `PARMENV` blocks and puts `envelopes` where the first one was, or before
/// `WAK`, or at the end of the slot.
fn merge_slot_envelopes(slot: &[Node], envelopes: Vec<Node>) -> Vec<Node> {
    let anchor = slot
        .iter()
        .position(|node| node.tag() == "PARMENV")
        .or_else(|| slot.iter().position(|node| node.tag() == "WAK"))
        .unwrap_or(slot.len());

    let mut merged: Vec<Node> = Vec::with_capacity(slot.len() + envelopes.len());
    let mut envelopes = Some(envelopes);
    for (index, node) in slot.iter().enumerate() {
        if index == anchor {
            merged.extend(envelopes.take().unwrap_or_default());
        }
        if node.tag() != "PARMENV" {
            merged.push(node.clone());
        }
    }
    merged.extend(envelopes.take().unwrap_or_default());
    merged
}

fn settings_insert_index(dest: &Node, layout: &RoleLayout) -> usize {
    match layout.role {
        TrackRole::Track => dest
            .child_index(layout.mute_solo_tag)
            .or_else(|| dest.child_index("NAME").map(|index| index + 1))
            .unwrap_or(0),
        TrackRole::Master => dest
            .children()
            .iter()
            .position(is_master_line)
            .unwrap_or(0),
    }
}

fn chain_insert_index(dest: &Node, layout: &RoleLayout) -> usize {
    let len = dest.children().len();
    match layout.role {
        TrackRole::Track => first_block(dest, ITEM_TAG).unwrap_or(len),
        TrackRole::Master => {
            let first_track = first_block(dest, TRACK_TAG);
            let limit = first_track.unwrap_or(len);
            dest.children()[..limit]
                .iter()
                .rposition(is_master_line)
                .map(|index| index + 1)
                .or(first_track)
                .unwrap_or(len)
        }
    }
}

fn envelope_insert_index(dest: &Node, layout: &RoleLayout, kind: EnvelopeKind) -> usize {
    let sibling = match kind {
        EnvelopeKind::Volume => dest.child_index(layout.pan_envelope_tag),
        _ => dest
            .child_index(layout.volume_envelope_tag)
            .map(|index| index + 1),
    };
    if let Some(index) = sibling {
        return index;
    }

    let len = dest.children().len();
    match layout.role {
        TrackRole::Track => dest
            .child_index(layout.chain_tag)
            .or_else(|| first_block(dest, ITEM_TAG))
            .unwrap_or(len),
        TrackRole::Master => dest
            .child_index(layout.chain_tag)
            .map(|index| index + 1)
            .or_else(|| first_block(dest, TRACK_TAG))
            .unwrap_or(len),
    }
}

fn first_block(dest: &Node, tag: &str) -> Option<usize> {
    dest.children()
        .iter()
        .position(|child| child.is_block() && child.tag() == tag)
}

fn is_master_line(node: &Node) -> bool {
    !node.is_block() && node.tag().starts_with("MASTER")
}
