use std::{fs, path::PathBuf};

use tempfile::tempdir;

use merrow_cli::{Args, run};

/// Collects all .mmd files from a directory
fn collect_definitions(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("mmd")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn demos_path() -> PathBuf {
    // Demos live at the workspace root
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(input: &PathBuf, output: &PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
        id: "graph".to_string(),
        base_url: None,
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_definitions(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!("{}.svg", demo_path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        match run(&args(demo_path, &output_path)) {
            Ok(()) => {
                let svg = fs::read_to_string(&output_path).unwrap();
                assert!(svg.starts_with("<svg"), "{}", demo_path.display());
                assert!(!svg.contains("url(#"), "{}", demo_path.display());
            }
            Err(e) => failed.push((demo_path.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_definitions(demos_path().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.svg",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        if run(&args(demo_path, &output_path)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
        assert!(!output_path.exists(), "{}", demo_path.display());
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
fn e2e_base_url_and_config() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[sequenceDiagram]\nmirrorActors = false\n").unwrap();

    let input = demos_path().join("sequence.mmd");
    let output = temp_dir.path().join("sequence.svg");
    let args = Args {
        config: Some(config_path.to_string_lossy().to_string()),
        id: "seq".to_string(),
        base_url: Some("https://docs.example.com/guide/?v=2".to_string()),
        ..args(&input, &output)
    };

    run(&args).expect("sequence demo renders");

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains(r#"id="seq""#));
    assert!(svg.contains("url(https://docs.example.com/guide/?v=2#arrowhead)"));
}
