use approx::assert_relative_eq;
use rppsync_core::{
    CopyField, CopySelection, PluginKind, Project, TrackRef, compare,
    fixtures::{session_a, session_b},
};

fn selection(fields: &[CopyField]) -> CopySelection {
    fields.iter().copied().collect()
}

fn source_track(project: &Project, name: &str) -> rppsync_core::TrackInfo {
    project
        .track_by_name(name)
        .map(|(_, track)| track)
        .expect("fixture track should exist")
}

/// Removes the first block whose header line starts with `header`, through its closing line.
fn without_block(text: &str, header: &str) -> String {
    let mut out = Vec::new();
    let mut closing: Option<String> = None;
    let mut removed = false;
    for line in text.lines() {
        if let Some(close) = &closing {
            if line == close {
                closing = None;
            }
            continue;
        }
        if !removed && line.starts_with(header) {
            let indent = &line[..line.len() - line.trim_start().len()];
            closing = Some(format!("{indent}>"));
            removed = true;
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}

#[test]
fn volume_and_effects_copy_replaces_only_those_fields() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Lead Vox");
    let dest = b.resolve("Lead Vox").expect("destination should resolve");

    let updated = b
        .copy_into(
            &source,
            dest,
            &selection(&[CopyField::Volume, CopyField::Effects]),
        )
        .expect("copy should succeed");

    assert_relative_eq!(updated.volume, 1.0);
    assert_eq!(updated.effect_names(), vec!["VST: Decapitator"]);
    assert_relative_eq!(updated.pan, 0.15);
    assert!(updated.volume_envelope.is_none());
    let pan_envelope = updated
        .pan_envelope
        .as_ref()
        .expect("pan envelope should be untouched");
    assert_eq!(pan_envelope.points.len(), 2);
    assert!(b.to_rpp_string().contains("    VOLPAN 1 0.15 -1 -1 1\n"));
}

#[test]
fn effects_only_copy_leaves_everything_else_byte_identical() {
    let a = session_a();
    let mut b = session_b();
    let before = b.to_rpp_string();
    let source = source_track(&a, "Lead Vox");

    b.copy_into(&source, TrackRef::Track(0), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");
    let after = b.to_rpp_string();

    assert_ne!(before, after);
    assert_eq!(
        without_block(&before, "    <FXCHAIN"),
        without_block(&after, "    <FXCHAIN")
    );
    assert!(after.contains("      PRESETNAME \"Warm Drive\"\n"));
    assert!(!after.contains("AVOX SYBIL"));
}

#[test]
fn repeating_a_copy_changes_nothing() {
    let a = session_a();
    let mut b = session_b();
    let all = CopySelection::all();

    for (source, dest) in [
        ("Lead Vox", TrackRef::Track(0)),
        ("Bass", TrackRef::Track(1)),
        ("Master", TrackRef::Master),
    ] {
        let source = source_track(&a, source);
        b.copy_into(&source, dest, &all).expect("first copy should succeed");
        let once = b.to_rpp_string();
        b.copy_into(&source, dest, &all).expect("second copy should succeed");
        assert_eq!(once, b.to_rpp_string(), "copy into {dest} is not idempotent");
    }
}

#[test]
fn copied_fields_read_back_equal_to_source() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Lead Vox");

    let updated = b
        .copy_into(&source, TrackRef::Track(0), &CopySelection::all())
        .expect("copy should succeed");
    let report = compare(&source, &updated);

    assert!(report.is_empty(), "unexpected differences: {report:?}");
    assert_eq!(
        updated
            .volume_envelope
            .as_ref()
            .map(|envelope| envelope.tag.as_str()),
        Some("VOLENV2")
    );
    assert!(updated.pan_envelope.is_none());
}

#[test]
fn missing_track_chain_is_created_before_first_item() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Bass");

    let updated = b
        .copy_into(&source, TrackRef::Track(1), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");

    assert_eq!(updated.effect_names(), vec!["loser/3BandEQ"]);
    let expected = "    MUTESOLO 1 0 0
    <FXCHAIN
      WNDRECT 24 52 655 408
      SHOW 0
      LASTSEL 0
      DOCKED 0
      BYPASS 0 0 0
      <JS loser/3BandEQ \"\"
        0 200 0 2000 0 -
      >
      FLOATPOS 0 0 0 0
      FXID {2E3F4051-6273-4849-9AAB-BCCDDEEFF001}
      WAK 0 0
    >
    <ITEM
";
    assert!(
        b.to_rpp_string().contains(expected),
        "chain not placed before the item:\n{}",
        b.to_rpp_string()
    );
}

#[test]
fn missing_master_chain_is_created_after_master_lines() {
    let a = session_a();
    let mut bare = Project::parse(
        "<REAPER_PROJECT 0.1 \"7.51/win64\" 1763106377
  TEMPO 120 4 4
  MASTER_VOLUME 1 0 -1 -1 1
  MASTERMUTESOLO 0
  MASTER_SEL 0
  <TRACK {00000000-0000-0000-0000-000000000001}
    NAME Only
  >
>
",
    )
    .expect("bare project should parse");
    let source = source_track(&a, "Master");

    let updated = bare
        .copy_into(&source, TrackRef::Master, &selection(&[CopyField::Effects]))
        .expect("copy should succeed");

    assert_eq!(updated.effect_names(), vec!["VST: ReaEQ (Cockos)"]);
    assert_eq!(updated.parameter_envelopes.len(), 1);
    let tags: Vec<&str> = bare
        .document()
        .root()
        .children()
        .iter()
        .map(rppsync_core::Node::tag)
        .collect();
    assert_eq!(
        tags,
        vec![
            "TEMPO",
            "MASTER_VOLUME",
            "MASTERMUTESOLO",
            "MASTER_SEL",
            "MASTERFXLIST",
            "TRACK"
        ]
    );
}

#[test]
fn no_chain_is_created_when_source_has_no_effects() {
    let a = session_a();
    let mut b = session_b();
    let before = b.to_rpp_string();
    let source = source_track(&a, "Drums");

    b.copy_into(&source, TrackRef::Track(2), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");

    assert_eq!(before, b.to_rpp_string());
}

#[test]
fn track_copies_into_master() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Lead Vox");

    let updated = b
        .copy_into(&source, TrackRef::Master, &CopySelection::all())
        .expect("copy should succeed");

    assert!(updated.is_master);
    assert_relative_eq!(updated.volume, 1.0);
    assert_eq!(updated.effect_names(), vec!["VST: Decapitator"]);
    let envelope = updated
        .volume_envelope
        .as_ref()
        .expect("volume envelope should be copied");
    assert_eq!(envelope.tag, "MASTERVOLENV2");
    assert_eq!(envelope.points.len(), 3);

    let tags: Vec<&str> = b
        .document()
        .root()
        .children()
        .iter()
        .map(rppsync_core::Node::tag)
        .collect();
    let chain = tags
        .iter()
        .position(|tag| *tag == "MASTERFXLIST")
        .expect("master chain should exist");
    assert_eq!(tags[chain + 1], "MASTERVOLENV2");
}

#[test]
fn master_copies_into_track_without_chain() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Master");

    let updated = b
        .copy_into(&source, TrackRef::Track(2), &CopySelection::all())
        .expect("copy should succeed");

    assert!(!updated.is_master);
    assert_eq!(updated.name, "Keys");
    assert_relative_eq!(updated.volume, 1.0);
    assert_eq!(updated.effect_names(), vec!["VST: ReaEQ (Cockos)"]);
    assert_eq!(updated.parameter_envelopes.len(), 1);
    assert_eq!(updated.parameter_envelopes[0].points.len(), 3);
    assert!(b.to_rpp_string().contains("    <FXCHAIN\n      WNDRECT 24 52 655 408\n"));
}

#[test]
fn master_copies_into_master() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Master");

    let updated = b
        .copy_into(
            &source,
            TrackRef::Master,
            &selection(&[CopyField::Volume, CopyField::Pan, CopyField::Effects]),
        )
        .expect("copy should succeed");

    assert!(compare(&source, &updated).is_empty());
}

#[test]
fn envelopes_only_merges_parameter_envelopes_into_matching_effects() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Master");

    let updated = b
        .copy_into(&source, TrackRef::Master, &selection(&[CopyField::Envelopes]))
        .expect("copy should succeed");

    assert_relative_eq!(updated.volume, 0.5);
    assert_eq!(updated.parameter_envelopes.len(), 1);
    let fx_id = updated.effects[0].fx_id.as_deref();
    assert_eq!(fx_id, Some("{9A8B7C6D-5E4F-4031-A2B3-C4D5E6F70812}"));

    let report = compare(&source, &updated);
    assert_eq!(report.len(), 1, "only the volume should differ: {report:?}");
    assert!(report.touches(&rppsync_core::DiffField::Volume));
}

#[test]
fn envelope_copy_removes_destination_envelopes_missing_from_source() {
    let a = session_a();
    let mut b = session_b();
    let source = source_track(&a, "Drums");

    let updated = b
        .copy_into(&source, TrackRef::Track(0), &selection(&[CopyField::Envelopes]))
        .expect("copy should succeed");

    assert!(updated.pan_envelope.is_none());
    assert!(updated.volume_envelope.is_none());
    assert_eq!(updated.effect_names(), vec!["VST: AVOX SYBIL (Antares)"]);
    assert!(!b.to_rpp_string().contains("PANENV2"));
}

#[test]
fn copy_within_one_project_uses_a_snapshot() {
    let mut a = session_a();
    let source = source_track(&a, "Lead Vox");

    let updated = a
        .copy_into(&source, TrackRef::Track(2), &CopySelection::all())
        .expect("copy should succeed");

    assert_eq!(updated.name, "Drums");
    assert_eq!(updated.effect_names(), vec!["VST: Decapitator"]);
    assert_eq!(
        source_track(&a, "Lead Vox").effect_names(),
        vec!["VST: Decapitator"]
    );
}

fn single_track_project(track: &str) -> Project {
    Project::parse(&format!(
        "<REAPER_PROJECT 0.1 \"7.51/win64\" 1763106377\n  TEMPO 120 4 4\n{track}>\n"
    ))
    .expect("single track project should parse")
}

fn js_slot(name: &str, fx_id: &str, envelopes: &[&str]) -> String {
    let mut slot = format!(
        "      BYPASS 0 0 0\n      <JS {name} \"\"\n        0 0 -\n      >\n      FLOATPOS 0 0 0 0\n      FXID {fx_id}\n"
    );
    for parameter in envelopes {
        slot.push_str(&format!(
            "      <PARMENV {parameter} 0 1 0.5\n        ACT 1 -1\n        PT 0 0.5 0\n        PT 1 0.25 0\n      >\n"
        ));
    }
    slot.push_str("      WAK 0 0\n");
    slot
}

fn chain_track(name: &str, slots: &[String]) -> String {
    format!(
        "  <TRACK\n    NAME {name}\n    <FXCHAIN\n      SHOW 0\n      LASTSEL 0\n      DOCKED 0\n{}    >\n  >\n",
        slots.concat()
    )
}

fn envelope_parameters(track: &rppsync_core::TrackInfo, position: usize) -> Vec<&str> {
    track
        .parameter_envelopes
        .iter()
        .filter_map(|envelope| envelope.target.as_ref())
        .filter(|target| target.effect_position == position)
        .map(|target| target.parameter.as_str())
        .collect()
}

#[test]
fn parameter_envelopes_follow_effects_in_a_reordered_chain() {
    let source_project = single_track_project(&chain_track(
        "Src",
        &[
            js_slot("fx/a", "{SRC-A}", &["0", "1"]),
            js_slot("fx/b", "{SRC-B}", &["2", "3"]),
        ],
    ));
    let mut dest = single_track_project(&chain_track(
        "Dst",
        &[js_slot("fx/b", "{DST-B}", &[]), js_slot("fx/a", "{DST-A}", &[])],
    ));
    let source = source_track(&source_project, "Src");

    let updated = dest
        .copy_into(&source, TrackRef::Track(0), &selection(&[CopyField::Envelopes]))
        .expect("copy should succeed");

    assert_eq!(updated.effect_names(), vec!["fx/b", "fx/a"]);
    let fx_ids: Vec<Option<&str>> = updated
        .effects
        .iter()
        .map(|effect| effect.fx_id.as_deref())
        .collect();
    assert_eq!(fx_ids, vec![Some("{DST-B}"), Some("{DST-A}")]);

    assert_eq!(envelope_parameters(&updated, 0), vec!["2", "3"]);
    assert_eq!(envelope_parameters(&updated, 1), vec!["0", "1"]);

    let chain = dest
        .track_node(TrackRef::Track(0))
        .and_then(|track| track.child("FXCHAIN"))
        .expect("chain should still exist");
    let tags: Vec<&str> = chain.children().iter().map(rppsync_core::Node::tag).collect();
    let slot = ["BYPASS", "JS", "FLOATPOS", "FXID", "PARMENV", "PARMENV", "WAK"];
    let expected: Vec<&str> = ["SHOW", "LASTSEL", "DOCKED"]
        .into_iter()
        .chain(slot)
        .chain(slot)
        .collect();
    assert_eq!(tags, expected);

    let rendered = dest.to_rpp_string();
    assert_eq!(rendered.matches("FXID {DST-A}").count(), 1);
    assert_eq!(rendered.matches("WAK 0 0").count(), 2);
}

const UNKNOWN_KIND_SLOT: &str = "      BYPASS 1 0 0
      <WASM \"x\" wasmfx.bin 0
        AAAAbbbbCCCC
        ddddEEEEffff
      >
      FLOATPOS 0 0 0 0
      FXID {5A5A5A5A-0000-4000-8000-000000000001}
      WAK 0 0
";

#[test]
fn unknown_plugin_kinds_are_kept_verbatim() {
    let source_project = single_track_project(&format!(
        "  <TRACK\n    NAME Odd\n    <FXCHAIN\n      SHOW 0\n      LASTSEL 0\n      DOCKED 0\n{UNKNOWN_KIND_SLOT}    >\n  >\n"
    ));
    let source = source_track(&source_project, "Odd");

    assert_eq!(source.effects.len(), 1);
    let effect = &source.effects[0];
    assert_eq!(effect.kind, PluginKind::Other("WASM".to_string()));
    assert_eq!(effect.name, "x");
    assert_eq!(effect.identifier, "wasmfx.bin");
    assert!(effect.bypassed);
    assert_eq!(source_project.info().track_count, 1);

    let mut b = session_b();
    let updated = b
        .copy_into(&source, TrackRef::Track(2), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");

    assert_eq!(updated.effects.len(), 1);
    assert_eq!(updated.effects[0].kind, PluginKind::Other("WASM".to_string()));
    assert_eq!(updated.effects[0].state_digest, effect.state_digest);
    assert!(
        b.to_rpp_string().contains(UNKNOWN_KIND_SLOT),
        "slot not rendered verbatim:\n{}",
        b.to_rpp_string()
    );
}

#[test]
fn replaced_chain_resets_selection_past_its_end() {
    let a = session_a();
    let source = source_track(&a, "Lead Vox");
    let header = |show: &str, last: &str| {
        format!(
            "  <TRACK\n    NAME Dst\n    <FXCHAIN\n      SHOW {show}\n      LASTSEL {last}\n      DOCKED 0\n{}{}    >\n  >\n",
            js_slot("fx/a", "{DST-A}", &[]),
            js_slot("fx/b", "{DST-B}", &[])
        )
    };

    let mut past = single_track_project(&header("2", "1"));
    past.copy_into(&source, TrackRef::Track(0), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");
    let rendered = past.to_rpp_string();
    assert!(rendered.contains("      SHOW 0\n      LASTSEL 0\n"), "{rendered}");

    let mut within = single_track_project(&header("1", "0"));
    within
        .copy_into(&source, TrackRef::Track(0), &selection(&[CopyField::Effects]))
        .expect("copy should succeed");
    assert!(
        within
            .to_rpp_string()
            .contains("      SHOW 1\n      LASTSEL 0\n")
    );
}
