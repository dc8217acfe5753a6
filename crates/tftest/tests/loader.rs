use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use test_case::test_case;

use tftest::{
    load_case, load_test_step, AttrCheck, State, StepCheck, TestOptions, TfTestError,
};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn options() -> TestOptions {
    TestOptions::assert_mode()
}

fn assert_checks(step: &tftest::TestStep) -> &[AttrCheck] {
    match &step.check {
        Some(StepCheck::Assert { checks, .. }) => checks.as_slice(),
        other => panic!("expected assertions, got {other:?}"),
    }
}

#[test]
fn test_load_case_orders_steps_by_path() {
    let case = load_case(&fixtures().join("basic"), &options()).unwrap();
    assert_eq!(case.steps.len(), 3);

    assert!(case.steps[0].source.ends_with("basic/01-create.tf"));
    assert!(case.steps[1].source.ends_with("basic/02-update.tf"));
    assert!(!case.steps[1].import_state);
    assert!(case.steps[2].import_state);
    assert_eq!(case.steps[2].config, case.steps[1].config);
}

#[test]
fn test_loading_the_whole_tree_includes_subdirectories() {
    let case = load_case(&fixtures(), &options()).unwrap();
    assert_eq!(case.steps.len(), 4);
    assert!(case.steps[3].expect_error.is_some());
}

#[test]
fn test_expect_error_fixture() {
    let steps = load_test_step(&fixtures().join("errors/test.tf"), &options()).unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(
        steps[0].config,
        "# ExpectError: error we will look for\nresource \"dummy_resource\" \"test\" {}\n"
    );
    assert_eq!(
        steps[0].expect_error.as_ref().unwrap().as_str(),
        "error we will look for"
    );
    assert!(steps[0].check.is_none());
}

#[test]
fn test_checks_only_cover_named_resources() {
    let steps = load_test_step(&fixtures().join("basic/01-create.tf"), &options()).unwrap();
    let checks = assert_checks(&steps[0]);
    assert!(checks.iter().all(|c| c.resource() == "dummy_resource.test"));
    assert_eq!(
        checks,
        &[
            AttrCheck::set("dummy_resource.test", "created_at"),
            AttrCheck::set("dummy_resource.test", "id"),
            AttrCheck::equals("dummy_resource.test", "name", "first"),
            AttrCheck::equals("dummy_resource.test", "tags.%", "0"),
        ]
    );
}

#[test]
fn test_without_ignore_predicate_timestamps_are_exact() {
    let opts = options().with_ignore_change(None);
    let steps = load_test_step(&fixtures().join("basic/01-create.tf"), &opts).unwrap();
    assert!(assert_checks(&steps[0]).contains(&AttrCheck::equals(
        "dummy_resource.test",
        "created_at",
        "2024-05-01T12:00:00Z"
    )));
}

#[test_case("first", true ; "matching state passes")]
#[test_case("changed", false ; "changed attribute fails")]
fn test_step_check_against_state(name: &str, passes: bool) {
    let steps = load_test_step(&fixtures().join("basic/01-create.tf"), &options()).unwrap();
    let state = State::default().with_resource(
        "dummy_resource.test",
        [
            ("id", "f81d4fae-7dec-11d0-a765-00a0c91e6bf6"),
            ("name", name),
            ("created_at", "2024-06-01T00:00:00Z"),
        ],
    );
    let result = steps[0].check.as_ref().unwrap().run(&state);
    assert_eq!(result.is_ok(), passes, "{result:?}");
    if let Err(err) = result {
        assert!(matches!(err, TfTestError::StepCheck { .. }));
        assert!(err.to_string().contains("01-create.tf"));
    }
}

fn copy_fixture(dir: &Path, name: &str) -> PathBuf {
    let from = fixtures().join("basic").join(name);
    let to = dir.join(name);
    fs::copy(from, &to).unwrap();
    to
}

#[test]
fn test_refresh_rewrites_snapshot_from_state() {
    let dir = TempDir::new().unwrap();
    let fragment = copy_fixture(dir.path(), "01-create.tf");

    let steps = load_test_step(&fragment, &options().with_refresh(true)).unwrap();
    assert_eq!(steps.len(), 1);

    let state = State::default()
        .with_resource(
            "dummy_resource.test",
            [
                ("%", "3"),
                ("id", "f81d4fae-7dec-11d0-a765-00a0c91e6bf6"),
                ("name", "first"),
                ("updated", "2024-06-01 10:00:00"),
            ],
        )
        .with_resource("dummy_resource.other", [("name", "x")]);
    steps[0].check.as_ref().unwrap().run(&state).unwrap();

    let written = fs::read_to_string(dir.path().join("01-create.json")).unwrap();
    assert_eq!(
        written,
        "{\n  \"dummy_resource.test\": {\n    \"id\": \"<set>\",\n    \"name\": \"first\",\n    \"updated\": \"<set>\"\n  }\n}\n"
    );

    // The refreshed snapshot is what the next assert run compares against.
    let steps = load_test_step(&fragment, &options()).unwrap();
    steps[0].check.as_ref().unwrap().run(&state).unwrap();
}

#[test]
fn test_refresh_fails_for_missing_resource() {
    let dir = TempDir::new().unwrap();
    let fragment = copy_fixture(dir.path(), "01-create.tf");
    let steps = load_test_step(&fragment, &options().with_refresh(true)).unwrap();
    let err = steps[0].check.as_ref().unwrap().run(&State::default()).unwrap_err();
    assert_eq!(err.to_string(), "Not found: dummy_resource.test in root");
    assert!(!dir.path().join("01-create.json").exists());
}

#[test]
fn test_malformed_snapshot_fails_loading() {
    let dir = TempDir::new().unwrap();
    let fragment = copy_fixture(dir.path(), "01-create.tf");
    fs::write(dir.path().join("01-create.json"), "{ not json").unwrap();
    let err = load_test_step(&fragment, &options()).unwrap_err();
    assert!(matches!(err, TfTestError::SnapshotParse { .. }));
}

#[test]
fn test_missing_fragment() {
    let err = load_test_step(&fixtures().join("absent.tf"), &options()).unwrap_err();
    assert!(matches!(err, TfTestError::Read { .. }));
}
