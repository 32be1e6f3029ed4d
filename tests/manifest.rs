use injector::injector::utils::unixify;
use injector::{load_manifest, load_manifest_files, resolve_components_dir};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn path_str(path: &Path) -> String {
    unixify(&path.to_string_lossy())
}

#[test]
fn components_dir_defaults_without_override_file() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("bower.json");

    let resolved = resolve_components_dir(&manifest);
    assert!(resolved.used_default);
    assert_eq!(resolved.path, dir.path().join("bower_components"));
}

#[test]
fn components_dir_follows_override_file() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".bowerrc"), r#"{"directory": "vendor/components"}"#);

    let resolved = resolve_components_dir(&dir.path().join("bower.json"));
    assert!(!resolved.used_default);
    assert_eq!(resolved.path, dir.path().join("vendor/components"));
}

#[test]
fn broken_override_file_falls_back_to_default() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".bowerrc"), "{ directory: ");

    let resolved = resolve_components_dir(&dir.path().join("bower.json"));
    assert!(resolved.used_default);
    assert_eq!(resolved.path, dir.path().join("bower_components"));

    write(&dir.path().join(".bowerrc"), r#"{"registry": "https://example.invalid"}"#);
    assert!(resolve_components_dir(&dir.path().join("bower.json")).used_default);
}

#[test]
fn dependencies_come_before_their_dependents() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("bower.json"),
        r#"{"name": "site", "dependencies": {"bootstrap": "~3.3", "jquery": "~2.1"}}"#,
    );
    write(
        &root.join("bower_components/bootstrap/bower.json"),
        r#"{
            "name": "bootstrap",
            "main": ["./dist/css/bootstrap.css", "./dist/js/bootstrap.js", "./dist/fonts/glyph.woff"],
            "dependencies": {"jquery": ">= 1.9.1"}
        }"#,
    );
    write(
        &root.join("bower_components/jquery/.bower.json"),
        r#"{"name": "jquery", "main": "dist/jquery.js"}"#,
    );

    let components = root.join("bower_components");
    let files = load_manifest(&root.join("bower.json")).unwrap();
    assert_eq!(
        files.css,
        vec![path_str(&components.join("bootstrap/dist/css/bootstrap.css"))]
    );
    assert_eq!(
        files.js,
        vec![
            path_str(&components.join("jquery/dist/jquery.js")),
            path_str(&components.join("bootstrap/dist/js/bootstrap.js")),
        ]
    );

    let flat = load_manifest_files(&root.join("bower.json")).unwrap();
    assert_eq!(flat.len(), 3);
    assert!(flat[0].ends_with("bootstrap.css"));
    assert!(flat[1].ends_with("jquery.js"));
    assert!(flat[2].ends_with("bootstrap.js"));
}

#[test]
fn root_overrides_replace_package_main() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("bower.json"),
        r#"{
            "dependencies": {"jquery": "~2.1"},
            "overrides": {"jquery": {"main": "dist/jquery.min.js"}}
        }"#,
    );
    write(
        &root.join("bower_components/jquery/bower.json"),
        r#"{"main": "dist/jquery.js"}"#,
    );

    let files = load_manifest_files(&root.join("bower.json")).unwrap();
    assert_eq!(
        files,
        vec![path_str(&root.join("bower_components/jquery/dist/jquery.min.js"))]
    );
}

#[test]
fn missing_packages_are_skipped_and_cycles_terminate() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join(".bowerrc"), r#"{"directory": "lib"}"#);
    write(
        &root.join("bower.json"),
        r#"{"dependencies": {"ghost": "*", "a": "*"}}"#,
    );
    write(
        &root.join("lib/a/bower.json"),
        r#"{"main": "a.js", "dependencies": {"b": "*"}}"#,
    );
    write(
        &root.join("lib/b/package.json"),
        r#"{"main": "b.js", "dependencies": {"a": "*"}}"#,
    );

    let files = load_manifest_files(&root.join("bower.json")).unwrap();
    assert_eq!(
        files,
        vec![
            path_str(&root.join("lib/b/b.js")),
            path_str(&root.join("lib/a/a.js")),
        ]
    );
}

#[test]
fn unreadable_manifest_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_manifest_files(&dir.path().join("bower.json")).is_err());

    write(&dir.path().join("bower.json"), "not json");
    assert!(load_manifest_files(&dir.path().join("bower.json")).is_err());
}
