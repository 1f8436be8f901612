use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::{Node, ROOT_TAG};

pub const DEFAULT_VOLUME: f64 = 1.0;
pub const DEFAULT_PAN: f64 = 0.0;
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const MASTER_TRACK_ID: &str = "MASTER";
pub const MASTER_TRACK_NAME: &str = "Master";
pub const UNTITLED_TRACK_NAME: &str = "Untitled Track";
pub const TRACK_TAG: &str = "TRACK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Track,
    Master,
}

impl TrackRole {
    #[must_use]
    pub fn of(node: &Node) -> Self {
        if node.tag() == ROOT_TAG {
            Self::Master
        } else {
            Self::Track
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRef {
    Master,
    Track(usize),
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => f.write_str("master"),
            Self::Track(index) => write!(f, "#{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackInfo {
    pub track_id: String,
    pub name: String,
    pub volume: f64,
    pub pan: f64,
    pub mute: bool,
    pub solo: bool,
    pub is_master: bool,
    pub effects: Vec<EffectInfo>,
    pub volume_envelope: Option<Envelope>,
    pub pan_envelope: Option<Envelope>,
    pub parameter_envelopes: Vec<Envelope>,
}

impl TrackInfo {
    #[must_use]
    pub fn role(&self) -> TrackRole {
        if self.is_master {
            TrackRole::Master
        } else {
            TrackRole::Track
        }
    }

    #[must_use]
    pub fn effect_names(&self) -> Vec<&str> {
        self.effects.iter().map(|effect| effect.name.as_str()).collect()
    }

    #[must_use]
    pub fn envelope_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(envelope) = self.volume_envelope.as_ref().filter(|env| env.active) {
            parts.push(format!("Vol({}pts)", envelope.points.len()));
        }
        if let Some(envelope) = self.pan_envelope.as_ref().filter(|env| env.active) {
            parts.push(format!("Pan({}pts)", envelope.points.len()));
        }
        let active_parameters = self
            .parameter_envelopes
            .iter()
            .filter(|envelope| envelope.active)
            .count();
        if active_parameters > 0 {
            parts.push(format!("{active_parameters} Param Envs"));
        }

        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_master { "Master" } else { "Track" };
        write!(
            f,
            "{prefix} '{}' (Vol: {:.2}, Pan: {:.2})",
            self.name, self.volume, self.pan
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Vst,
    Js,
    Au,
    Dx,
    Lv2,
    Clap,
    Video,
    Container,
    Other(String),
}

impl PluginKind {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "VST" => Self::Vst,
            "JS" => Self::Js,
            "AU" => Self::Au,
            "DX" => Self::Dx,
            "LV2" => Self::Lv2,
            "CLAP" => Self::Clap,
            "VIDEO_EFFECT" => Self::Video,
            "CONTAINER" => Self::Container,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Vst => "VST",
            Self::Js => "JS",
            Self::Au => "AU",
            Self::Dx => "DX",
            Self::Lv2 => "LV2",
            Self::Clap => "CLAP",
            Self::Video => "VIDEO_EFFECT",
            Self::Container => "CONTAINER",
            Self::Other(tag) => tag,
        }
    }

    /// Kinds whose first header parameter is already the identifying path.
    #[must_use]
    pub fn identified_by_name(&self) -> bool {
        matches!(self, Self::Js | Self::Video | Self::Container)
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectInfo {
    pub position: usize,
    pub kind: PluginKind,
    pub name: String,
    pub identifier: String,
    pub fx_id: Option<String>,
    pub bypassed: bool,
    pub preset: Option<String>,
    pub state_digest: String,
    #[serde(skip)]
    pub slot: Vec<Node>,
}

impl EffectInfo {
    #[must_use]
    pub fn signature(&self) -> EffectSignature {
        EffectSignature {
            kind: self.kind.clone(),
            identifier: self.identifier.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EffectSignature {
    pub kind: PluginKind,
    pub identifier: String,
}

impl fmt::Display for EffectSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Volume,
    Pan,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnvelopeTarget {
    pub effect_position: usize,
    pub effect_name: String,
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    pub tag: String,
    pub target: Option<EnvelopeTarget>,
    pub active: bool,
    pub visible: bool,
    pub guid: Option<String>,
    pub points: Vec<EnvelopePoint>,
    #[serde(skip)]
    pub node: Node,
}

impl Envelope {
    #[must_use]
    pub fn key(&self) -> EnvelopeKey {
        match (&self.kind, &self.target) {
            (EnvelopeKind::Volume, _) => EnvelopeKey::Volume,
            (EnvelopeKind::Pan, _) => EnvelopeKey::Pan,
            (EnvelopeKind::Parameter, Some(target)) => EnvelopeKey::Parameter {
                effect: target.effect_name.clone(),
                parameter: target.parameter.clone(),
            },
            (EnvelopeKind::Parameter, None) => EnvelopeKey::Parameter {
                effect: String::new(),
                parameter: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopePoint {
    pub time: f64,
    pub value: f64,
    pub shape: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKey {
    Volume,
    Pan,
    Parameter { effect: String, parameter: String },
}

impl fmt::Display for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume => f.write_str("volume envelope"),
            Self::Pan => f.write_str("pan envelope"),
            Self::Parameter { effect, parameter } => {
                write!(f, "parameter envelope {effect} / {parameter}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub version: String,
    pub app_version: String,
    pub timestamp: Option<i64>,
    pub track_count: usize,
    pub total_track_count: usize,
    pub has_master_effects: bool,
    pub tempo: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_track(name: &str) -> TrackInfo {
        TrackInfo {
            track_id: String::new(),
            name: name.to_string(),
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            mute: false,
            solo: false,
            is_master: false,
            effects: Vec::new(),
            volume_envelope: None,
            pan_envelope: None,
            parameter_envelopes: Vec::new(),
        }
    }

    #[test]
    fn plugin_kind_round_trips_known_and_unknown_tags() {
        for tag in ["VST", "JS", "AU", "DX", "LV2", "CLAP", "VIDEO_EFFECT", "CONTAINER"] {
            assert_eq!(PluginKind::from_tag(tag).tag(), tag);
        }
        let other = PluginKind::from_tag("WASM");
        assert_eq!(other, PluginKind::Other("WASM".to_string()));
        assert_eq!(other.tag(), "WASM");
    }

    #[test]
    fn track_display_and_summary() {
        let track = bare_track("Bass");
        assert_eq!(track.to_string(), "Track 'Bass' (Vol: 1.00, Pan: 0.00)");
        assert_eq!(track.envelope_summary(), "None");
        assert_eq!(TrackRef::Track(2).to_string(), "#2");
        assert_eq!(TrackRef::Master.to_string(), "master");
    }
}
