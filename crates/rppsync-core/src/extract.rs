use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    model::{
        DEFAULT_PAN, DEFAULT_VOLUME, EffectInfo, EffectSignature, Envelope, EnvelopeKind,
        EnvelopePoint, EnvelopeTarget, MASTER_TRACK_ID, MASTER_TRACK_NAME, PluginKind,
        TrackInfo, TrackRole, UNTITLED_TRACK_NAME,
    },
    node::Node,
};

pub const SETTINGS_DEFAULTS: [&str; 5] = ["1", "0", "-1", "-1", "1"];

/// Chain blocks that belong to an effect slot without being the effect itself.
const SLOT_AUXILIARY_BLOCKS: [&str; 3] = ["PARMENV", "PROGRAMENV", "COMMENT"];
const VOLATILE_SLOT_TAGS: [&str; 3] = ["FXID", "FLOATPOS", "PARMENV"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLayout {
    pub role: TrackRole,
    pub settings_tag: &'static str,
    pub mute_solo_tag: &'static str,
    pub chain_tag: &'static str,
    pub volume_envelope_tag: &'static str,
    pub pan_envelope_tag: &'static str,
}

pub const TRACK_LAYOUT: RoleLayout = RoleLayout {
    role: TrackRole::Track,
    settings_tag: "VOLPAN",
    mute_solo_tag: "MUTESOLO",
    chain_tag: "FXCHAIN",
    volume_envelope_tag: "VOLENV2",
    pan_envelope_tag: "PANENV2",
};

pub const MASTER_LAYOUT: RoleLayout = RoleLayout {
    role: TrackRole::Master,
    settings_tag: "MASTER_VOLUME",
    mute_solo_tag: "MASTERMUTESOLO",
    chain_tag: "MASTERFXLIST",
    volume_envelope_tag: "MASTERVOLENV2",
    pan_envelope_tag: "MASTERPANENV2",
};

#[must_use]
pub fn layout_for(role: TrackRole) -> &'static RoleLayout {
    match role {
        TrackRole::Track => &TRACK_LAYOUT,
        TrackRole::Master => &MASTER_LAYOUT,
    }
}

#[must_use]
pub fn extract(node: &Node) -> TrackInfo {
    match TrackRole::of(node) {
        TrackRole::Master => extract_master(node),
        TrackRole::Track => extract_track(node),
    }
}

#[must_use]
pub fn extract_track(node: &Node) -> TrackInfo {
    let layout = &TRACK_LAYOUT;
    let track_id = node
        .param(0)
        .or_else(|| node.child("TRACKID").and_then(|line| line.param(0)))
        .unwrap_or_default()
        .to_string();
    let name = node
        .child("NAME")
        .and_then(|line| line.param(0))
        .unwrap_or(UNTITLED_TRACK_NAME)
        .to_string();

    let (mute, solo) = node
        .child(layout.mute_solo_tag)
        .map_or((false, false), |line| (flag(line, 0), flag(line, 1)));

    build(node, layout, track_id, name, mute, solo)
}

#[must_use]
pub fn extract_master(root: &Node) -> TrackInfo {
    let layout = &MASTER_LAYOUT;
    let bits = root
        .child(layout.mute_solo_tag)
        .and_then(|line| line.param_i64(0))
        .unwrap_or_default();

    build(
        root,
        layout,
        MASTER_TRACK_ID.to_string(),
        MASTER_TRACK_NAME.to_string(),
        bits & 1 != 0,
        bits & 2 != 0,
    )
}

fn build(
    node: &Node,
    layout: &RoleLayout,
    track_id: String,
    name: String,
    mute: bool,
    solo: bool,
) -> TrackInfo {
    let (volume, pan) = node.child(layout.settings_tag).map_or(
        (DEFAULT_VOLUME, DEFAULT_PAN),
        |line| {
            (
                number(line, 0, DEFAULT_VOLUME),
                number(line, 1, DEFAULT_PAN),
            )
        },
    );

    let (effects, parameter_envelopes) = node
        .child(layout.chain_tag)
        .map(extract_chain)
        .unwrap_or_default();

    let volume_envelope = node
        .child(layout.volume_envelope_tag)
        .map(|envelope| extract_envelope(envelope, EnvelopeKind::Volume, None));
    let pan_envelope = node
        .child(layout.pan_envelope_tag)
        .map(|envelope| extract_envelope(envelope, EnvelopeKind::Pan, None));

    debug!(
        track = %name,
        role = ?layout.role,
        effects = effects.len(),
        parameter_envelopes = parameter_envelopes.len(),
        "track extracted"
    );

    TrackInfo {
        track_id,
        name,
        volume,
        pan,
        mute,
        solo,
        is_master: layout.role == TrackRole::Master,
        effects,
        volume_envelope,
        pan_envelope,
        parameter_envelopes,
    }
}

#[must_use]
pub fn extract_chain(chain: &Node) -> (Vec<EffectInfo>, Vec<Envelope>) {
    let children = chain.children();
    let mut effects = Vec::new();
    let mut envelopes = Vec::new();

    for span in scan_chain(chain).slots {
        let Some(plugin_index) = span.plugin else {
            debug!(start = span.start, "chain slot without plugin block skipped");
            continue;
        };
        let slot = &children[span.start..span.end];
        let plugin = &children[plugin_index];
        let position = effects.len();
        let signature = plugin_signature(plugin);
        let name = plugin.param(0).unwrap_or(plugin.tag()).to_string();

        for envelope in slot.iter().filter(|node| node.tag() == "PARMENV") {
            let target = EnvelopeTarget {
                effect_position: position,
                effect_name: name.clone(),
                parameter: envelope.param(0).unwrap_or_default().to_string(),
            };
            envelopes.push(extract_envelope(
                envelope,
                EnvelopeKind::Parameter,
                Some(target),
            ));
        }

        effects.push(EffectInfo {
            position,
            kind: signature.kind,
            name,
            identifier: signature.identifier,
            fx_id: slot_param(slot, "FXID"),
            bypassed: slot
                .iter()
                .find(|node| node.tag() == "BYPASS")
                .is_some_and(|line| flag(line, 0)),
            preset: slot_param(slot, "PRESETNAME"),
            state_digest: state_digest(slot),
            slot: slot.to_vec(),
        });
    }

    (effects, envelopes)
}

#[must_use]
pub fn extract_envelope(
    node: &Node,
    kind: EnvelopeKind,
    target: Option<EnvelopeTarget>,
) -> Envelope {
    let mut points = Vec::new();
    for point in node.children_tagged("PT") {
        match (point.param_f64(0), point.param_f64(1)) {
            (Some(time), Some(value)) => points.push(EnvelopePoint {
                time,
                value,
                shape: point.params().get(2..).unwrap_or_default().to_vec(),
            }),
            _ => warn!(
                envelope = node.tag(),
                params = ?point.params(),
                "skipping malformed envelope point"
            ),
        }
    }

    Envelope {
        kind,
        tag: node.tag().to_string(),
        target,
        active: node.child("ACT").is_none_or(|line| flag(line, 0)),
        visible: node.child("VIS").is_none_or(|line| flag(line, 0)),
        guid: node
            .child("EGUID")
            .and_then(|line| line.param(0))
            .map(ToString::to_string),
        points,
        node: node.clone(),
    }
}

#[must_use]
pub fn plugin_signature(plugin: &Node) -> EffectSignature {
    let kind = PluginKind::from_tag(plugin.tag());
    let name = plugin.param(0).unwrap_or_default();
    let identifier = if kind.identified_by_name() {
        name
    } else {
        plugin
            .param(1)
            .filter(|file| !file.is_empty())
            .unwrap_or(name)
    };
    EffectSignature {
        kind,
        identifier: identifier.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotSpan {
    pub start: usize,
    pub end: usize,
    pub plugin: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainScan {
    pub first_slot: usize,
    pub slots: Vec<SlotSpan>,
}

/// Splits a chain's children into header and slots. `BYPASS` opens a slot; a plugin block
/// joins the open slot if that slot has no plugin yet, otherwise it opens its own.
pub(crate) fn scan_chain(chain: &Node) -> ChainScan {
    let children = chain.children();
    let mut slots: Vec<SlotSpan> = Vec::new();

    for (index, child) in children.iter().enumerate() {
        if child.tag() == "BYPASS" && !child.is_block() {
            slots.push(SlotSpan {
                start: index,
                end: index,
                plugin: None,
            });
        } else if is_plugin_block(child) {
            match slots.last_mut() {
                Some(slot) if slot.plugin.is_none() => slot.plugin = Some(index),
                _ => slots.push(SlotSpan {
                    start: index,
                    end: index,
                    plugin: Some(index),
                }),
            }
        }
    }

    let starts: Vec<usize> = slots.iter().skip(1).map(|slot| slot.start).collect();
    for (slot, end) in slots
        .iter_mut()
        .zip(starts.into_iter().chain(std::iter::once(children.len())))
    {
        slot.end = end;
    }

    ChainScan {
        first_slot: slots.first().map_or(children.len(), |slot| slot.start),
        slots,
    }
}

fn is_plugin_block(node: &Node) -> bool {
    node.is_block() && !SLOT_AUXILIARY_BLOCKS.contains(&node.tag())
}

fn state_digest(slot: &[Node]) -> String {
    let mut hasher = Sha256::new();
    for node in slot
        .iter()
        .filter(|node| !VOLATILE_SLOT_TAGS.contains(&node.tag()))
    {
        hasher.update(node.canonical_text().as_bytes());
    }
    let digest = hasher.finalize();
    format!("{digest:x}")
}

fn slot_param(slot: &[Node], tag: &str) -> Option<String> {
    slot.iter()
        .find(|node| node.tag() == tag)
        .and_then(|line| line.param(0))
        .map(ToString::to_string)
}

fn flag(line: &Node, index: usize) -> bool {
    line.param_i64(index).is_some_and(|value| value != 0)
}

fn number(line: &Node, index: usize, default: f64) -> f64 {
    match line.param(index) {
        None => default,
        Some(raw) => line.param_f64(index).unwrap_or_else(|| {
            warn!(tag = line.tag(), index, raw, "unparseable number, using default");
            default
        }),
    }
}
