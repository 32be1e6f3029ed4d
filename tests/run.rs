use injector::injector::utils::unixify;
use injector::{run, Options};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PAGE: &str = "<html>\n<head>\n  <!-- injector:css -->\n  <!-- endinjector -->\n</head>\n<body>\n    <!-- injector:js -->\n    <!-- endinjector -->\n</body>\n</html>\n";

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Root of the scratch directory as a `/`-terminated string.
fn root_prefix(root: &Path) -> String {
    format!("{}/", unixify(&root.to_string_lossy()))
}

fn site(root: &Path) {
    write(&root.join("index.html"), PAGE);
    write(&root.join("js/app.js"), "");
    write(&root.join("js/vendor.js"), "");
    write(&root.join("css/site.css"), "");
}

#[test]
fn injects_scripts_into_templates_from_inputs() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    site(root);
    let prefix = root_prefix(root);

    let mut options = Options::new("js");
    options.inputs = vec![format!("{prefix}js/*.js"), format!("{prefix}index.html")];
    options.strip_prefix = vec![prefix.clone()];

    let summary = run(&options).unwrap();
    assert_eq!(summary.assets, vec!["/js/app.js", "/js/vendor.js"]);
    assert_eq!(summary.reports.len(), 1);
    assert!(summary.reports[0].changed);
    assert_eq!(
        summary.reports[0].message,
        format!("Injecting {} files (2 files)", summary.reports[0].target.display())
    );

    let page = fs::read_to_string(root.join("index.html")).unwrap();
    assert!(page.contains(
        "    <!-- injector:js -->\n    <script src=\"/js/app.js\"></script>\n    <script src=\"/js/vendor.js\"></script>\n    <!-- endinjector -->"
    ));
    // The css region belongs to another assets extension.
    assert!(page.contains("  <!-- injector:css -->\n  <!-- endinjector -->"));
}

#[test]
fn second_run_changes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    site(root);
    let prefix = root_prefix(root);

    let mut options = Options::new("css");
    options.inputs = vec![prefix.clone()];
    options.strip_prefix = vec![prefix.clone()];
    options.add_root_slash = false;

    let first = run(&options).unwrap();
    assert_eq!(first.assets, vec!["css/site.css"]);
    assert_eq!(first.changed(), 1);
    let after_first = fs::read_to_string(root.join("index.html")).unwrap();

    let second = run(&options).unwrap();
    assert_eq!(second.changed(), 0);
    assert!(second.reports.iter().all(|r| r.message == "Nothing changed"));
    assert_eq!(fs::read_to_string(root.join("index.html")).unwrap(), after_first);
}

#[test]
fn directory_inputs_treat_other_files_as_templates() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    site(root);
    let prefix = root_prefix(root);

    let mut options = Options::new("css");
    options.inputs = vec![prefix.clone()];
    options.strip_prefix = vec![prefix];

    let summary = run(&options).unwrap();
    // index.html plus the two scripts, none of which have markers.
    assert_eq!(summary.reports.len(), 3);
    assert_eq!(summary.changed(), 1);
    assert_eq!(fs::read_to_string(root.join("js/app.js")).unwrap(), "");
}

#[test]
fn template_is_rendered_into_dest_with_relative_paths() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let prefix = root_prefix(root);
    write(&root.join("src/index.html"), PAGE);
    write(&root.join("dist/js/app.js"), "");

    let mut options = Options::new("js");
    options.inputs = vec![format!("{prefix}dist/js/*.js")];
    options.template = Some(root.join("src/index.html"));
    options.dest = Some(root.join("dist/index.html"));
    options.relative = true;
    options.add_root_slash = false;

    let summary = run(&options).unwrap();
    assert_eq!(summary.assets, vec!["js/app.js"]);
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].target, root.join("dist/index.html"));

    assert_eq!(fs::read_to_string(root.join("src/index.html")).unwrap(), PAGE);
    let written = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(written.contains("    <script src=\"js/app.js\"></script>\n"));
}

#[test]
fn minified_assets_are_preferred_when_requested() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let prefix = root_prefix(root);
    write(&root.join("index.html"), PAGE);
    write(&root.join("js/app.js"), "");
    write(&root.join("js/app.min.js"), "");

    let mut options = Options::new("js");
    options.inputs = vec![format!("{prefix}js/app.js")];
    options.dest = Some(root.join("index.html"));
    options.strip_prefix = vec![prefix];
    options.min = true;

    let summary = run(&options).unwrap();
    assert_eq!(summary.assets, vec!["/js/app.min.js"]);
}

#[test]
fn missing_destination_aborts_the_run() {
    let dir = tempdir().unwrap();
    let mut options = Options::new("js");
    options.dest = Some(dir.path().join("missing.html"));

    let err = run(&options).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read template file"));
}

#[test]
fn manifest_dependencies_are_injected_before_inputs() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let prefix = root_prefix(root);
    write(&root.join("index.html"), PAGE);
    write(&root.join("js/app.js"), "");
    write(
        &root.join("bower.json"),
        r#"{"name": "site", "dependencies": {"jquery": "~2.1"}}"#,
    );
    write(
        &root.join("bower_components/jquery/bower.json"),
        r#"{"name": "jquery", "main": ["dist/jquery.js", "dist/jquery.css"]}"#,
    );

    let mut options = Options::new("js");
    options.inputs = vec![format!("{prefix}js/app.js")];
    options.dest = Some(root.join("index.html"));
    options.manifest = Some(root.join("bower.json"));
    options.strip_prefix = vec![prefix];

    let summary = run(&options).unwrap();
    assert_eq!(
        summary.assets,
        vec!["/bower_components/jquery/dist/jquery.js", "/js/app.js"]
    );
}

#[test]
fn strict_mode_skips_unsupported_assets() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let prefix = root_prefix(root);
    write(
        &root.join("index.html"),
        "<!-- injector:txt -->\n<!-- endinjector -->\n",
    );
    write(&root.join("notes.txt"), "");

    let mut options = Options::new("txt");
    options.inputs = vec![format!("{prefix}notes.txt")];
    options.dest = Some(root.join("index.html"));
    options.strip_prefix = vec![prefix.clone()];

    run(&options).unwrap();
    assert_eq!(
        fs::read_to_string(root.join("index.html")).unwrap(),
        "<!-- injector:txt -->\n\n<!-- endinjector -->\n"
    );

    options.strict = true;
    run(&options).unwrap();
    assert_eq!(
        fs::read_to_string(root.join("index.html")).unwrap(),
        "<!-- injector:txt -->\n<!-- endinjector -->\n"
    );
}

#[test]
fn binary_files_in_directory_inputs_are_left_alone() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let prefix = root_prefix(root);
    write(&root.join("index.html"), PAGE);
    write(&root.join("js/app.js"), "");
    let logo = [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00];
    fs::create_dir_all(root.join("img")).unwrap();
    fs::write(root.join("img/logo.png"), logo).unwrap();

    let mut options = Options::new("js");
    options.inputs = vec![prefix.clone()];
    options.strip_prefix = vec![prefix];

    let summary = run(&options).unwrap();
    assert_eq!(summary.assets, vec!["/js/app.js"]);
    assert_eq!(summary.changed(), 1);

    let skipped = summary
        .reports
        .iter()
        .find(|r| r.target.ends_with("img/logo.png"))
        .unwrap();
    assert!(!skipped.changed);
    assert_eq!(skipped.message, "Nothing changed");
    assert_eq!(fs::read(root.join("img/logo.png")).unwrap(), logo);

    let page = fs::read_to_string(root.join("index.html")).unwrap();
    assert!(page.contains("    <script src=\"/js/app.js\"></script>\n"));
}

#[test]
fn missing_template_option_is_reported_as_a_notice() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("index.html"), PAGE);

    let mut options = Options::new("js");
    options.dest = Some(root.join("index.html"));
    let summary = run(&options).unwrap();
    assert_eq!(
        summary.notices,
        vec!["Missing option `template`, using `dest` as template instead"]
    );

    options.template = Some(root.join("index.html"));
    assert!(run(&options).unwrap().notices.is_empty());
}

#[test]
fn empty_assets_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("index.html"), PAGE);

    let mut options = Options::new("");
    options.inputs = vec![root_prefix(root)];

    let err = run(&options).unwrap_err();
    assert!(err.to_string().contains("assets_ext"));
}
