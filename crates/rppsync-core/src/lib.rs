pub mod compare;
pub mod copy;
pub mod diagnostics;
pub mod extract;
pub mod fixtures;
pub mod model;
pub mod node;
pub mod persistence;
pub mod project;

pub use compare::{
    CompareOptions, DEFAULT_EPSILON, DiffEntry, DiffField, DiffKind, DiffReport, DiffValue,
    compare, compare_with,
};
pub use copy::{CopyField, CopySelection, UnknownCopyField, copy_track};
pub use diagnostics::{
    DEFAULT_LOG_FILE_PREFIX, DEFAULT_LOG_FILTER, TelemetryGuard, init_tracing,
    init_tracing_with_file_prefix, init_tracing_with_options,
};
pub use extract::{extract, extract_chain, extract_envelope, extract_master, extract_track};
pub use model::{
    EffectInfo, EffectSignature, Envelope, EnvelopeKey, EnvelopeKind, EnvelopePoint,
    EnvelopeTarget, PluginKind, ProjectInfo, TrackInfo, TrackRef, TrackRole,
};
pub use node::{Document, LineEnding, Node, NodeKind, ParseError};
pub use persistence::{load_project, save_project};
pub use project::{Project, ProjectError, TrackMatch, compare_projects};
