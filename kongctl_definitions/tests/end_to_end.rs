//! Black-box loader scenarios: each test writes real YAML to a temp
//! directory and drives `Loader::load_from_sources` end to end, the same
//! level the loader's own unit tests stop short of.

use std::fs;

use kongctl_definitions::loader::source::{parse_sources, Source};
use kongctl_definitions::{DefError, DefErrKind, Loader};

fn write(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn minimal_portal_applies_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "portal.yaml",
        r#"
portals:
- ref: main
  name: Main Portal
  kongctl:
    namespace: team-alpha
"#,
    );

    let loader = Loader::new(dir.path(), false);
    let sources = vec![Source::File(dir.path().join("portal.yaml"))];
    let set = loader.load_from_sources(&sources).unwrap();

    assert_eq!(set.portals.len(), 1);
    assert_eq!(set.portals[0].ref_, "main");
    assert_eq!(set.portals[0].name, "Main Portal");
}

#[test]
fn duplicate_ref_across_types_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.yaml",
        r#"
portals:
- ref: shared
  name: A Portal
"#,
    );
    write(
        dir.path(),
        "b.yaml",
        r#"
application_auth_strategies:
- ref: shared
  name: A Strategy
  strategy_type: key_auth
"#,
    );

    let loader = Loader::new(dir.path(), false);
    let sources = vec![
        Source::File(dir.path().join("a.yaml")),
        Source::File(dir.path().join("b.yaml")),
    ];
    let err = loader.load_from_sources(&sources).unwrap_err();
    assert!(err.to_string().contains("duplicate ref 'shared'"));

    let def_err = err.downcast_ref::<DefError>().expect("duplicate ref must raise a DefError");
    assert!(
        matches!(def_err.kind(), DefErrKind::Configuration(_)),
        "duplicate ref is a load-time configuration error, not a remote-name conflict: got {:?}",
        def_err.kind()
    );
}

#[test]
fn ref_tag_resolves_against_a_sibling_resource() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "auth.yaml",
        r#"
application_auth_strategies:
- ref: default-key-auth
  name: default-key-auth
  strategy_type: key_auth

portals:
- ref: main
  name: Main Portal
  default_application_auth_strategy_id: !ref default-key-auth
"#,
    );

    let loader = Loader::new(dir.path(), false);
    let sources = parse_sources(dir.path().join("auth.yaml").to_str().unwrap());
    let set = loader.load_from_sources(&sources).unwrap();

    let portal = &set.portals[0];
    // the resolver overwrites the placeholder once the target's remote id
    // is known; before that point it still carries the resolved-ref bookkeeping.
    assert!(set.resolved_refs.iter().any(|r| r.source_ref == "main" && r.target_ref == "default-key-auth"));
    assert!(portal.default_application_auth_strategy_id.is_some());
}

#[test]
fn file_tag_path_escaping_tag_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("outside.json").as_path(), b"{}").unwrap();
    write(
        &sub,
        "api.yaml",
        r#"
apis:
- ref: orders
  name: Orders API
  versions:
  - version: "1.0"
    spec: !file ../outside.json
"#,
    );

    let loader = Loader::new(&sub, false);
    let sources = vec![Source::File(sub.join("api.yaml"))];
    let err = loader.load_from_sources(&sources).unwrap_err();
    assert!(err.to_string().contains("resolves outside") || err.to_string().contains("escape"));
}

#[test]
fn deck_block_survives_loading_for_the_planner() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "services.yaml", "_format_version: \"3.0\"\n");
    write(
        dir.path(),
        "cp.yaml",
        r#"
control_planes:
- ref: prod
  name: Production
  deck:
    files:
    - services.yaml
  gateway_services:
  - ref: orders-svc
    name: orders
    external:
      selector:
        match_fields:
          name: orders
"#,
    );

    let loader = Loader::new(dir.path(), false);
    let sources = vec![
        Source::File(dir.path().join("cp.yaml")),
    ];
    let set = loader.load_from_sources(&sources).unwrap();

    let cp = &set.control_planes[0];
    let deck = cp.deck.as_ref().expect("deck block preserved");
    assert_eq!(deck.files, vec!["services.yaml".to_string()]);
    assert_eq!(set.gateway_services.len(), 1);
    assert!(set.gateway_services[0].external.is_some());
}
