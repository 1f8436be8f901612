use crate::project::Project;

pub const SESSION_A_RPP: &str = r#"<REAPER_PROJECT 0.1 "7.51/win64" 1763106377
  RIPPLE 0 0
  GROUPOVERRIDE 0 0 0 0
  TEMPO 120 4 4
  MASTER_VOLUME 1 0 -1 -1 1
  MASTER_PANMODE 3
  MASTERMUTESOLO 0
  MASTER_SEL 0
  <MASTERFXLIST
    WNDRECT 24 52 655 408
    SHOW 0
    LASTSEL 0
    DOCKED 0
    BYPASS 0 0 0
    <VST "VST: ReaEQ (Cockos)" reaeq.dll 0 "" 1919247729<56535472656571726561657100000000> ""
      cWVlcu5e7f4CAAAAAQAAAAAAAAACAAAAAAAAAAIAAAABAAAAAAAAAAIAAAAAAAAAHgAAAAAAAAA=
      AAAQAAAA
    >
    FLOATPOS 0 0 0 0
    FXID {6D5E2A1C-3B0F-4E58-9C1A-1F0E2D3C4B5A}
    <PARMENV 1 0 1 0.5
      EGUID {0F1E2D3C-4B5A-6978-8796-A5B4C3D2E1F0}
      ACT 1 -1
      VIS 1 1 1
      LANEHEIGHT 0 0
      ARM 0
      DEFSHAPE 0 -1 -1
      PT 0 0.5 0
      PT 2 0.75 0
      PT 4 0.25 0
    >
    WAK 0 0
  >
  <TRACK {A858D602-18C1-491F-9352-37B286CF4C0D}
    NAME "Lead Vox"
    PEAKCOL 16576
    BEAT -1
    AUTOMODE 0
    VOLPAN 1 0 -1 -1 1
    MUTESOLO 0 0 0
    IPHASE 0
    <VOLENV2
      EGUID {1A2B3C4D-5E6F-4071-8293-A4B5C6D7E8F9}
      ACT 1 -1
      VIS 1 1 1
      LANEHEIGHT 0 0
      ARM 0
      DEFSHAPE 0 -1 -1
      VOLTYPE 1
      PT 0 1 0
      PT 4 0.5 0
      PT 8 1 0
    >
    <FXCHAIN
      WNDRECT 24 52 655 408
      SHOW 0
      LASTSEL 0
      DOCKED 0
      BYPASS 0 0 0
      <VST "VST: Decapitator" Decapitator.dll 0 "" 1684366896 ""
        MGFwZe5e7f4CAAAAAQAAAAAAAAACAAAAAAAAAAIAAAABAAAAAAAAAAIAAAAAAAAA
        AAAQAAAA
      >
      PRESETNAME "Warm Drive"
      FLOATPOS 0 0 0 0
      FXID {C4D5E6F7-0819-4A2B-BC3D-4E5F60718293}
      WAK 0 0
    >
  >
  <TRACK {B858D602-18C1-491F-9352-37B286CF4C0D}
    NAME Bass
    PEAKCOL 16576
    VOLPAN 0.85 -0.1 -1 -1 1
    MUTESOLO 0 0 0
    <FXCHAIN
      WNDRECT 24 52 655 408
      SHOW 0
      LASTSEL 0
      DOCKED 0
      BYPASS 0 0 0
      <JS loser/3BandEQ ""
        0 200 0 2000 0 -
      >
      FLOATPOS 0 0 0 0
      FXID {2E3F4051-6273-4849-9AAB-BCCDDEEFF001}
      WAK 0 0
    >
    <ITEM
      POSITION 0
      LENGTH 8
      NAME "bass take"
      <SOURCE WAVE
        FILE "Media/bass.wav"
      >
    >
  >
  <TRACK {C858D602-18C1-491F-9352-37B286CF4C0D}
    NAME Drums
    VOLPAN 0.9 0.2 -1 -1 1
    MUTESOLO 0 0 0
  >
  <EXTENSIONS
  >
>
"#;

pub const SESSION_B_RPP: &str = r#"<REAPER_PROJECT 0.1 "7.51/win64" 1763200000
  RIPPLE 0 0
  GROUPOVERRIDE 0 0 0 0
  TEMPO 96 4 4
  MASTER_VOLUME 0.5 0 -1 -1 1
  MASTER_PANMODE 3
  MASTERMUTESOLO 0
  MASTER_SEL 0
  <MASTERFXLIST
    WNDRECT 24 52 655 408
    SHOW 0
    LASTSEL 0
    DOCKED 0
    BYPASS 0 0 0
    <VST "VST: ReaEQ (Cockos)" reaeq.dll 0 "" 1919247729<56535472656571726561657100000000> ""
      cWVlcu5e7f4CAAAAAQAAAAAAAAACAAAAAAAAAAIAAAABAAAAAAAAAAIAAAAAAAAAHgAAAAAAAAA=
      AAAQAAAA
    >
    FLOATPOS 120 80 640 420
    FXID {9A8B7C6D-5E4F-4031-A2B3-C4D5E6F70812}
    WAK 0 0
  >
  <TRACK {D858D602-18C1-491F-9352-37B286CF4C0D}
    NAME "Lead Vox"
    PEAKCOL 16576
    BEAT -1
    AUTOMODE 0
    VOLPAN 0.79 0.15 -1 -1 1
    MUTESOLO 0 0 0
    IPHASE 0
    <PANENV2
      EGUID {7F6E5D4C-3B2A-4190-8F7E-6D5C4B3A2918}
      ACT 1 -1
      VIS 1 1 1
      LANEHEIGHT 0 0
      ARM 0
      DEFSHAPE 0 -1 -1
      PT 0 -0.5 0
      PT 6 0.5 0
    >
    <FXCHAIN
      WNDRECT 24 52 655 408
      SHOW 0
      LASTSEL 0
      DOCKED 0
      BYPASS 0 0 0
      <VST "VST: AVOX SYBIL (Antares)" "AVOX SYBIL.dll" 0 "" 1398362700 ""
        c3liaO5e7f4CAAAAAQAAAAAAAAACAAAAAAAAAAIAAAABAAAAAAAAAAIAAAAAAAAA
        AAAQAAAA
      >
      FLOATPOS 0 0 0 0
      FXID {E1F20314-2536-4748-B9CA-DBECFD0E1F20}
      WAK 0 0
    >
  >
  <TRACK {E858D602-18C1-491F-9352-37B286CF4C0D}
    NAME Bass
    PEAKCOL 16576
    VOLPAN 0.7 0.1 -1 -1 1
    MUTESOLO 1 0 0
    <ITEM
      POSITION 0
      LENGTH 8
      NAME "bass take"
      <SOURCE WAVE
        FILE "Media/bass.wav"
      >
    >
  >
  <TRACK {F858D602-18C1-491F-9352-37B286CF4C0D}
    NAME Keys
    VOLPAN 0.6 0 -1 -1 1
    MUTESOLO 0 1 0
  >
  <EXTENSIONS
  >
>
"#;

#[must_use]
pub fn session_a() -> Project {
    Project::parse(SESSION_A_RPP).expect("session A fixture should parse")
}

#[must_use]
pub fn session_b() -> Project {
    Project::parse(SESSION_B_RPP).expect("session B fixture should parse")
}
