#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use appian_pack::config::BuildConfig;
use appian_pack::error::{PackError, ToolError};
use appian_pack::package::{run_tool, Packager, MANIFEST_PREFIX};
use appian_pack::workspace::ProjectLayout;
use serial_test::serial;
use tempfile::TempDir;

fn tools(javac: &str, jar: &str) -> BuildConfig {
    BuildConfig {
        javac: javac.to_string(),
        jar: jar.to_string(),
    }
}

fn project_with_sources() -> TempDir {
    let project = tempfile::tempdir().unwrap();
    let pkg = project.path().join("java/acme/tools");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("AddOne.java"), "package acme.tools; class AddOne {}").unwrap();
    fs::write(pkg.join("messages.txt"), "copied as-is").unwrap();
    project
}

fn leftover_manifests(dir: &Path) -> Vec<String> {
    common::entries(dir)
        .into_iter()
        .filter(|name| name.starts_with(MANIFEST_PREFIX))
        .collect()
}

/// Writes an executable shell script and returns its path.
///
/// Tests in this file are serial so no concurrently spawned child can hold
/// the script open for writing while it is executed.
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
#[serial]
fn test_run_tool_reports_non_zero_exit() {
    match run_tool("false", Vec::<String>::new()) {
        Err(ToolError::Failed { program, status, .. }) => {
            assert_eq!(program, "false");
            assert!(!status.success());
        }
        other => panic!("expected a failed tool, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_run_tool_reports_missing_program() {
    let err = run_tool("appian-pack-no-such-tool", ["-version"]).unwrap_err();
    assert!(matches!(err, ToolError::NotFound { .. }), "got {err:?}");
}

#[test]
#[serial]
fn test_run_tool_captures_stdout() {
    let output = run_tool("echo", ["hello"]).expect("echo succeeds");
    assert_eq!(output.stdout.trim(), "hello");
}

#[test]
#[serial]
fn test_successful_build_copies_sources_and_removes_manifest() {
    let project = project_with_sources();
    let layout = ProjectLayout::new(project.path());
    let config = common::plugin_config(common::config_json("acme.tools"));
    let tools = tools("true", "true");

    let artifact = Packager::new(&layout, &tools)
        .build(&config)
        .expect("build succeeds");

    assert_eq!(artifact.path, project.path().join("plugin.jar"));
    let copied = layout.out_dir().join("src/acme/tools");
    assert!(copied.join("AddOne.java").is_file());
    assert!(copied.join("messages.txt").is_file());
    assert!(leftover_manifests(project.path()).is_empty());
}

#[test]
#[serial]
fn test_failed_compile_is_an_error_and_removes_manifest() {
    let project = project_with_sources();
    let layout = ProjectLayout::new(project.path());
    let config = common::plugin_config(common::config_json("acme.tools"));
    let tools = tools("false", "true");

    let err = Packager::new(&layout, &tools).build(&config).unwrap_err();

    assert!(
        matches!(err, PackError::Tool(ToolError::Failed { ref program, .. }) if program == "false"),
        "got {err:?}"
    );
    assert!(leftover_manifests(project.path()).is_empty());
}

#[test]
#[serial]
fn test_compiler_receives_manifest_of_every_source() {
    let project = project_with_sources();
    fs::write(project.path().join("java/Root.java"), "class Root {}").unwrap();
    let layout = ProjectLayout::new(project.path());
    let config = common::plugin_config(common::config_json("acme.tools"));
    let captured = project.path().join("captured.txt");
    let javac = script(
        project.path(),
        "fake-javac",
        &format!(
            "for arg in \"$@\"; do case \"$arg\" in @*) cat \"${{arg#@}}\" > '{}';; esac; done",
            captured.display()
        ),
    );
    let tools = tools(&javac.display().to_string(), "true");

    Packager::new(&layout, &tools).build_main(&config).expect("build succeeds");

    let listed = fs::read_to_string(&captured).unwrap();
    let lines: Vec<&str> = listed.lines().collect();
    assert_eq!(lines.len(), 2, "only .java files are listed: {listed}");
    assert!(lines[0].starts_with('"') && lines[0].ends_with("Root.java\""));
    assert!(lines[1].ends_with("AddOne.java\""));
    assert!(leftover_manifests(project.path()).is_empty());
}

/// A failing support archive does not stop the main archive.
#[test]
#[serial]
fn test_missing_phase_failure_is_not_fatal() {
    let project = project_with_sources();
    let missing = project.path().join("missing/org/vendor");
    fs::create_dir_all(&missing).unwrap();
    fs::write(missing.join("Helper.java"), "class Helper {}").unwrap();
    let layout = ProjectLayout::new(project.path());
    let config = common::plugin_config(common::config_json("acme.tools"));
    let jar = script(
        project.path(),
        "fake-jar",
        "case \"$2\" in *missing.jar) exit 3;; esac\ntouch \"$2\"",
    );
    let tools = tools("true", &jar.display().to_string());
    let packager = Packager::new(&layout, &tools);

    assert!(packager.build_missing().is_err());
    let artifact = packager.build(&config).expect("main phase still succeeds");

    assert!(artifact.path.is_file());
    assert!(!layout.missing_jar().exists());
    assert!(leftover_manifests(project.path()).is_empty());
}

#[test]
#[serial]
fn test_missing_phase_skipped_without_sources() {
    let project = project_with_sources();
    let layout = ProjectLayout::new(project.path());
    let tools = tools("false", "false");

    let built = Packager::new(&layout, &tools).build_missing().expect("nothing to do");
    assert!(built.is_none());
}
