use std::fmt;

use approx::relative_eq;
use serde::{Deserialize, Serialize};

use crate::model::{EffectInfo, Envelope, EnvelopeKey, TrackInfo};

pub const DEFAULT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    pub epsilon: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl CompareOptions {
    #[must_use]
    pub fn approx_eq(&self, left: f64, right: f64) -> bool {
        relative_eq!(
            left,
            right,
            epsilon = self.epsilon,
            max_relative = self.epsilon
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffField {
    Name,
    Volume,
    Pan,
    Mute,
    Solo,
    Effects,
    Effect(String),
    Envelope(EnvelopeKey),
    EnvelopeActive(EnvelopeKey),
    EnvelopePoint { envelope: EnvelopeKey, index: usize },
}

impl fmt::Display for DiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Volume => f.write_str("volume"),
            Self::Pan => f.write_str("pan"),
            Self::Mute => f.write_str("mute"),
            Self::Solo => f.write_str("solo"),
            Self::Effects => f.write_str("effect order"),
            Self::Effect(name) => write!(f, "effect {name}"),
            Self::Envelope(key) => write!(f, "{key}"),
            Self::EnvelopeActive(key) => write!(f, "{key} active"),
            Self::EnvelopePoint { envelope, index } => write!(f, "{envelope} point {index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Changed,
    Added,
    Removed,
    Reordered,
    Presence,
    PointCount,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Changed => "changed",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Reordered => "reordered",
            Self::Presence => "presence",
            Self::PointCount => "point count",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiffValue {
    Absent,
    Number(f64),
    Flag(bool),
    Text(String),
    Count(usize),
    List(Vec<String>),
    Point { time: f64, value: f64 },
    Effect { position: usize, digest: String },
}

impl fmt::Display for DiffValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("(absent)"),
            Self::Number(value) => write!(f, "{value:.6}"),
            Self::Flag(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Count(value) => write!(f, "{value}"),
            Self::List(values) => write!(f, "[{}]", values.join(", ")),
            Self::Point { time, value } => write!(f, "{time:.6}s = {value:.6}"),
            Self::Effect { position, digest } => {
                write!(f, "slot {position} ({})", digest.get(..12).unwrap_or(digest))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub field: DiffField,
    pub kind: DiffKind,
    pub left: DiffValue,
    pub right: DiffValue,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} | {}",
            self.field, self.kind, self.left, self.right
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub left: String,
    pub right: String,
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiffKind) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    #[must_use]
    pub fn touches(&self, field: &DiffField) -> bool {
        self.entries.iter().any(|entry| &entry.field == field)
    }
}

impl<'a> IntoIterator for &'a DiffReport {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[must_use]
pub fn compare(left: &TrackInfo, right: &TrackInfo) -> DiffReport {
    compare_with(left, right, &CompareOptions::default())
}

#[must_use]
pub fn compare_with(left: &TrackInfo, right: &TrackInfo, options: &CompareOptions) -> DiffReport {
    let mut entries = Vec::new();

    if left.name != right.name {
        entries.push(changed(
            DiffField::Name,
            DiffValue::Text(left.name.clone()),
            DiffValue::Text(right.name.clone()),
        ));
    }
    for (field, a, b) in [
        (DiffField::Volume, left.volume, right.volume),
        (DiffField::Pan, left.pan, right.pan),
    ] {
        if !options.approx_eq(a, b) {
            entries.push(changed(field, DiffValue::Number(a), DiffValue::Number(b)));
        }
    }
    for (field, a, b) in [
        (DiffField::Mute, left.mute, right.mute),
        (DiffField::Solo, left.solo, right.solo),
    ] {
        if a != b {
            entries.push(changed(field, DiffValue::Flag(a), DiffValue::Flag(b)));
        }
    }

    diff_effects(&left.effects, &right.effects, &mut entries);

    diff_envelope(
        EnvelopeKey::Volume,
        left.volume_envelope.as_ref(),
        right.volume_envelope.as_ref(),
        options,
        &mut entries,
    );
    diff_envelope(
        EnvelopeKey::Pan,
        left.pan_envelope.as_ref(),
        right.pan_envelope.as_ref(),
        options,
        &mut entries,
    );
    diff_parameter_envelopes(
        &left.parameter_envelopes,
        &right.parameter_envelopes,
        options,
        &mut entries,
    );

    DiffReport {
        left: left.name.clone(),
        right: right.name.clone(),
        entries,
    }
}

fn changed(field: DiffField, left: DiffValue, right: DiffValue) -> DiffEntry {
    DiffEntry {
        field,
        kind: DiffKind::Changed,
        left,
        right,
    }
}

fn effect_value(effect: &EffectInfo) -> DiffValue {
    DiffValue::Effect {
        position: effect.position,
        digest: effect.state_digest.clone(),
    }
}

/// Matches effects by signature, k-th occurrence to k-th occurrence, then reports what is
/// left over on either side, state changes of matched pairs and any change in their order.
fn diff_effects(left: &[EffectInfo], right: &[EffectInfo], entries: &mut Vec<DiffEntry>) {
    let mut used = vec![false; right.len()];
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for (i, effect) in left.iter().enumerate() {
        let signature = effect.signature();
        let matched = right
            .iter()
            .enumerate()
            .position(|(j, other)| !used[j] && other.signature() == signature);
        match matched {
            Some(j) => {
                used[j] = true;
                pairs.push((i, j));
            }
            None => entries.push(DiffEntry {
                field: DiffField::Effect(effect.name.clone()),
                kind: DiffKind::Removed,
                left: effect_value(effect),
                right: DiffValue::Absent,
            }),
        }
    }

    for (effect, _) in right.iter().zip(&used).filter(|(_, used)| !**used) {
        entries.push(DiffEntry {
            field: DiffField::Effect(effect.name.clone()),
            kind: DiffKind::Added,
            left: DiffValue::Absent,
            right: effect_value(effect),
        });
    }

    for &(i, j) in &pairs {
        if left[i].state_digest != right[j].state_digest {
            entries.push(changed(
                DiffField::Effect(left[i].name.clone()),
                effect_value(&left[i]),
                effect_value(&right[j]),
            ));
        }
    }

    if pairs.windows(2).any(|pair| pair[0].1 > pair[1].1) {
        let left_order = pairs.iter().map(|&(i, _)| left[i].name.clone()).collect();
        let mut by_right = pairs.clone();
        by_right.sort_by_key(|&(_, j)| j);
        let right_order = by_right
            .iter()
            .map(|&(_, j)| right[j].name.clone())
            .collect();
        entries.push(DiffEntry {
            field: DiffField::Effects,
            kind: DiffKind::Reordered,
            left: DiffValue::List(left_order),
            right: DiffValue::List(right_order),
        });
    }
}

fn diff_envelope(
    key: EnvelopeKey,
    left: Option<&Envelope>,
    right: Option<&Envelope>,
    options: &CompareOptions,
    entries: &mut Vec<DiffEntry>,
) {
    let (left, right) = match (left, right) {
        (None, None) => return,
        (Some(envelope), None) => {
            entries.push(DiffEntry {
                field: DiffField::Envelope(key),
                kind: DiffKind::Presence,
                left: DiffValue::Count(envelope.points.len()),
                right: DiffValue::Absent,
            });
            return;
        }
        (None, Some(envelope)) => {
            entries.push(DiffEntry {
                field: DiffField::Envelope(key),
                kind: DiffKind::Presence,
                left: DiffValue::Absent,
                right: DiffValue::Count(envelope.points.len()),
            });
            return;
        }
        (Some(left), Some(right)) => (left, right),
    };

    if left.active != right.active {
        entries.push(changed(
            DiffField::EnvelopeActive(key.clone()),
            DiffValue::Flag(left.active),
            DiffValue::Flag(right.active),
        ));
    }
    if left.points.len() != right.points.len() {
        entries.push(DiffEntry {
            field: DiffField::Envelope(key.clone()),
            kind: DiffKind::PointCount,
            left: DiffValue::Count(left.points.len()),
            right: DiffValue::Count(right.points.len()),
        });
    }
    for (index, (a, b)) in left.points.iter().zip(&right.points).enumerate() {
        if !options.approx_eq(a.time, b.time) || !options.approx_eq(a.value, b.value) {
            entries.push(changed(
                DiffField::EnvelopePoint {
                    envelope: key.clone(),
                    index,
                },
                DiffValue::Point {
                    time: a.time,
                    value: a.value,
                },
                DiffValue::Point {
                    time: b.time,
                    value: b.value,
                },
            ));
        }
    }
}

fn diff_parameter_envelopes(
    left: &[Envelope],
    right: &[Envelope],
    options: &CompareOptions,
    entries: &mut Vec<DiffEntry>,
) {
    let mut used = vec![false; right.len()];
    for envelope in left {
        let key = envelope.key();
        let matched = right
            .iter()
            .enumerate()
            .position(|(j, other)| !used[j] && other.key() == key);
        let counterpart = matched.map(|j| {
            used[j] = true;
            &right[j]
        });
        diff_envelope(key, Some(envelope), counterpart, options, entries);
    }
    for (envelope, _) in right.iter().zip(&used).filter(|(_, used)| !**used) {
        diff_envelope(envelope.key(), None, Some(envelope), options, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_absorbs_round_trip_noise() {
        let options = CompareOptions::default();
        assert!(options.approx_eq(0.794_328_234_724_281_5, 0.794_328_234_724_28));
        assert!(options.approx_eq(0.0, 5e-7));
        assert!(!options.approx_eq(0.0, 2e-6));
        assert!(!options.approx_eq(0.79, 1.0));
    }

    #[test]
    fn diff_values_render_without_special_cases() {
        let values = [
            DiffValue::Absent,
            DiffValue::Number(0.5),
            DiffValue::Flag(true),
            DiffValue::Text("Drums".to_string()),
            DiffValue::Count(3),
            DiffValue::List(vec!["A".to_string(), "B".to_string()]),
            DiffValue::Point {
                time: 1.0,
                value: 0.25,
            },
            DiffValue::Effect {
                position: 0,
                digest: "abc".to_string(),
            },
        ];
        let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "(absent)",
                "0.500000",
                "true",
                "Drums",
                "3",
                "[A, B]",
                "1.000000s = 0.250000",
                "slot 0 (abc)"
            ]
        );
    }
}
