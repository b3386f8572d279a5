//! Index file loading, querying and regeneration

mod helper;

use rstest::rstest;
use tempfile::TempDir;

use chart_index::index::{IndexError, load_index, load_index_file, write_index_file};
use chart_index::repo::{RepoError, index_directory, update_index};
use helper::{index_yaml, write_chart_archive};

#[rstest]
#[case("", "1.3.0")]
#[case("1.2.0", "1.2.0")]
#[case("~1.2.0", "1.2.5")]
#[case(">=1.2.0 <1.3.0", "1.2.5")]
#[case("<1.2.1 || >=1.3.0", "1.3.0")]
fn loaded_index_answers_version_queries(#[case] constraint: &str, #[case] expected: &str) {
    let catalog = load_index(index_yaml(&[("foo", &["1.2.0", "1.3.0", "1.2.5"])]).as_bytes())
        .unwrap();

    let record = catalog.get("foo", constraint).unwrap();

    assert_eq!(record.version, expected);
    assert_eq!(record.urls, vec![format!("foo-{}.tgz", expected)]);
}

#[test]
fn loaded_index_orders_versions_newest_first() {
    let catalog = load_index(index_yaml(&[("foo", &["1.2.0", "1.3.0", "1.2.5"])]).as_bytes())
        .unwrap();

    let versions: Vec<_> = catalog.entries["foo"]
        .iter()
        .map(|r| r.version.as_str())
        .collect();

    assert_eq!(versions, vec!["1.3.0", "1.2.5", "1.2.0"]);
}

#[test]
fn unknown_chart_or_version_is_not_found() {
    let catalog = load_index(index_yaml(&[("foo", &["1.2.0"])]).as_bytes()).unwrap();

    assert!(matches!(
        catalog.get("bar", ""),
        Err(IndexError::ChartNotFound { .. })
    ));
    assert!(matches!(
        catalog.get("foo", "^2"),
        Err(IndexError::ChartNotFound { .. })
    ));
}

#[rstest]
#[case("")]
#[case("   \n")]
fn blank_input_is_rejected(#[case] input: &str) {
    assert!(matches!(
        load_index(input.as_bytes()),
        Err(IndexError::EmptyInput)
    ));
}

#[test]
fn index_without_api_version_is_rejected() {
    let result = load_index(b"entries:\n  foo: []\n");

    assert!(matches!(result, Err(IndexError::NoApiVersion)));
}

#[test]
fn written_index_loads_back_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.yaml");
    let catalog = load_index(
        index_yaml(&[("foo", &["1.0.0", "2.0.0"]), ("bar", &["0.1.0"])]).as_bytes(),
    )
    .unwrap();

    write_index_file(&catalog, &path).unwrap();
    let loaded = load_index_file(&path).unwrap();

    assert_eq!(loaded, catalog);
}

#[test]
fn missing_index_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.yaml");

    let result = load_index_file(&path);

    assert!(matches!(result, Err(IndexError::Io { path: ref p, .. }) if p == &path));
}

#[test]
fn index_directory_collects_nested_archives() {
    let temp_dir = TempDir::new().unwrap();
    write_chart_archive(&temp_dir.path().join("foo-1.0.0.tgz"), "foo", "1.0.0");
    write_chart_archive(&temp_dir.path().join("foo-1.1.0.tgz"), "foo", "1.1.0");
    write_chart_archive(&temp_dir.path().join("nested/bar-0.2.0.tgz"), "bar", "0.2.0");
    std::fs::write(temp_dir.path().join("README.md"), "not a chart").unwrap();

    let catalog = index_directory(temp_dir.path(), "https://charts.example/stable").unwrap();

    assert_eq!(catalog.get("foo", "").unwrap().version, "1.1.0");
    assert_eq!(
        catalog.get("bar", "").unwrap().urls,
        vec!["https://charts.example/stable/nested/bar-0.2.0.tgz".to_string()]
    );
    assert_eq!(catalog.get("foo", "1.0.0").unwrap().digest.len(), 64);
}

#[test]
fn index_directory_rejects_regular_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("foo-1.0.0.tgz");
    write_chart_archive(&file, "foo", "1.0.0");

    let result = index_directory(&file, "");

    assert!(matches!(result, Err(RepoError::NotADirectory(_))));
}

#[test]
fn update_index_writes_index_next_to_charts() {
    let temp_dir = TempDir::new().unwrap();
    write_chart_archive(&temp_dir.path().join("foo-1.0.0.tgz"), "foo", "1.0.0");

    let out = update_index(temp_dir.path(), "", None).unwrap();

    assert_eq!(out, temp_dir.path().join("index.yaml"));
    let written = load_index_file(&out).unwrap();
    assert_eq!(
        written.get("foo", "1.0.0").unwrap().urls,
        vec!["foo-1.0.0.tgz".to_string()]
    );
}

#[test]
fn update_index_creates_missing_merge_target() {
    let temp_dir = TempDir::new().unwrap();
    let charts = temp_dir.path().join("charts");
    write_chart_archive(&charts.join("foo-1.0.0.tgz"), "foo", "1.0.0");
    let merge_target = temp_dir.path().join("upstream.yaml");

    update_index(&charts, "", Some(&merge_target)).unwrap();

    let created = load_index_file(&merge_target).unwrap();
    assert_eq!(created.api_version, "v1");
    assert!(created.entries.is_empty());
    assert!(load_index_file(&charts.join("index.yaml")).unwrap().has("foo", "1.0.0"));
}

#[test]
fn update_index_keeps_remote_only_entries() {
    let temp_dir = TempDir::new().unwrap();
    let charts = temp_dir.path().join("charts");
    write_chart_archive(&charts.join("foo-1.0.0.tgz"), "foo", "1.0.0");
    let upstream = temp_dir.path().join("upstream.yaml");
    std::fs::write(&upstream, index_yaml(&[("bar", &["3.0.0"])])).unwrap();

    let out = update_index(&charts, "", Some(&upstream)).unwrap();

    let written = load_index_file(&out).unwrap();
    assert!(written.has("foo", "1.0.0"));
    assert!(written.has("bar", "3.0.0"));
}
