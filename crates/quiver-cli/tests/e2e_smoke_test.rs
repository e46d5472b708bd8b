use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use quiver::document::DiagramDocument;
use quiver_cli::{Args, run};

/// Collects all .toml files from a directory
fn collect_toml_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn args_for(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        normalize: None,
        strict: false,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_demos = collect_toml_files(demos_path());

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_path = temp_dir
            .path()
            .join(format!("{}.svg", demo_path.file_stem().unwrap().to_string_lossy()));

        let args = args_for(demo_path, &output_path);
        match run(&args) {
            Ok(()) => {
                let svg = fs::read_to_string(&output_path).expect("SVG written");
                assert!(svg.contains("<svg"), "{} produced no SVG", demo_path.display());
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_toml_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_path = temp_dir.path().join(format!(
            "error_{}.svg",
            demo_path.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args_for(demo_path, &output_path)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_normalize_writes_loadable_document() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = demos_path().join("flowchart.toml");
    let normalized = temp_dir.path().join("normalized.toml");

    let mut args = args_for(&input, &temp_dir.path().join("flowchart.svg"));
    args.normalize = Some(normalized.to_string_lossy().to_string());
    run(&args).expect("flowchart demo renders");

    let text = fs::read_to_string(&normalized).expect("normalized document written");
    let document: DiagramDocument = toml::from_str(&text).expect("normalized document parses");
    assert_eq!(document.shapes.len(), 6);
    assert_eq!(document.connectors.len(), 6);
    assert_eq!(document.labels.len(), 2);
    assert_eq!(document.groups.len(), 1);
    assert_eq!(document.groups[0].members.len(), 2);
}

#[test]
fn e2e_strict_rejects_dangling_connectors() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("dangling.toml");
    fs::write(
        &input,
        r#"
[[shapes]]
id = 1
kind = "rectangle"
x = 0.0
y = 0.0
bounding_center_x = 0.0
bounding_center_y = 0.0

[[connectors]]
start_id = 1
end_id = 42
color = "black"
endpoint_x = 0.0
endpoint_y = 0.0
"#,
    )
    .unwrap();

    let mut args = args_for(&input, &temp_dir.path().join("dangling.svg"));
    run(&args).expect("dangling connectors are dropped by default");

    args.strict = true;
    assert!(run(&args).is_err());
}
