use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, diff};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const MISSING_PIP: &str = "reqsift-test-no-such-pip";

/// Empty site-packages directory so resolution never touches the machine's
/// real Python installation.
fn empty_site_packages(root: &Path) -> PathBuf {
    let dir = root.join("site-packages");
    fs::create_dir_all(&dir).expect("mkdir should work");
    dir
}

fn write_dist_info(site_packages: &Path, dir: &str, name: &str, version: &str) {
    let info = site_packages.join(dir);
    fs::create_dir_all(&info).expect("mkdir should work");
    fs::write(
        info.join("METADATA"),
        format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n"),
    )
    .expect("write should work");
}

#[test]
fn generate_on_empty_tree_writes_empty_manifest() {
    let dir = tempdir().expect("tempdir should work");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).expect("mkdir should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            src.to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success()
        .stdout(contains("Generated"));

    assert_eq!(fs::read_to_string(&output).expect("manifest should exist"), "");
}

#[test]
fn stdlib_imports_never_reach_the_manifest() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(
        dir.path().join("app.py"),
        "import os\nimport json\nimport subprocess\n",
    )
    .expect("write should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success()
        // Nothing needed resolving, so the missing pip is never mentioned.
        .stderr(contains(MISSING_PIP).not());

    assert_eq!(fs::read_to_string(&output).expect("manifest should exist"), "");
}

#[test]
fn syntax_error_file_warns_and_run_continues() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(dir.path().join("broken.py"), "def broken(:\n").expect("write should work");
    fs::write(dir.path().join("fine.py"), "import os\n").expect("write should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success()
        .stderr(contains("could not parse"))
        .stderr(contains("broken.py"));

    assert_eq!(fs::read_to_string(&output).expect("manifest should exist"), "");
}

#[test]
fn registry_match_resolves_without_pip() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(dir.path().join("app.py"), "import requests\n").expect("write should work");
    let sp = empty_site_packages(dir.path());
    write_dist_info(&sp, "requests-2.31.0.dist-info", "requests", "2.31.0");
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success()
        // Registry hit, so the unavailable fallback tool is never invoked.
        .stderr(contains("not found").not());

    assert_eq!(
        fs::read_to_string(&output).expect("manifest should exist"),
        "requests==2.31.0\n"
    );
}

#[test]
fn missing_pip_skips_name_but_run_succeeds() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(dir.path().join("app.py"), "import requests\n").expect("write should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success()
        .stderr(contains(MISSING_PIP))
        .stderr(contains("requests"));

    assert_eq!(fs::read_to_string(&output).expect("manifest should exist"), "");
}

#[cfg(unix)]
#[test]
fn pip_fallback_output_is_parsed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().expect("tempdir should work");
    fs::write(dir.path().join("app.py"), "import requests\n").expect("write should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    let fake_pip = dir.path().join("fake-pip");
    fs::write(
        &fake_pip,
        "#!/bin/sh\necho \"Name: requests\"\necho \"Version: 2.31.0\"\n",
    )
    .expect("write should work");
    fs::set_permissions(&fake_pip, fs::Permissions::from_mode(0o755))
        .expect("chmod should work");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            fake_pip.to_str().expect("path utf8"),
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).expect("manifest should exist"),
        "requests==2.31.0\n"
    );
}

#[cfg(unix)]
#[test]
fn pip_nonzero_exit_skips_with_diagnostic() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(
        dir.path().join("views.py"),
        "from google import generativeai\n",
    )
    .expect("write should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            dir.path().to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            "false",
        ])
        .assert()
        .success()
        .stderr(contains("skipping 'google'"));

    assert_eq!(fs::read_to_string(&output).expect("manifest should exist"), "");
}

#[test]
fn config_file_excludes_local_modules() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(
        dir.path().join("views.py"),
        "import weather\nimport os\nimport requests\n",
    )
    .expect("write should work");
    fs::write(
        dir.path().join("reqsift.json"),
        r#"{"local_modules":["weather"]}"#,
    )
    .expect("write should work");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args(["imports", "."])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(diff("requests\n"));
}

#[test]
fn imports_lists_sorted_candidates() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(
        dir.path().join("app.py"),
        "import os\nimport requests\nfrom google import generativeai\n",
    )
    .expect("write should work");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args(["imports", dir.path().to_str().expect("path utf8")])
        .assert()
        .success()
        .stdout(diff("google\nrequests\n"));
}

#[test]
fn cli_flags_extend_exclusions() {
    let dir = tempdir().expect("tempdir should work");
    fs::write(
        dir.path().join("app.py"),
        "import django\nimport weather_ai_app\nimport requests\n",
    )
    .expect("write should work");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "imports",
            dir.path().to_str().expect("path utf8"),
            "--stdlib-module",
            "django",
            "--local-module",
            "weather_ai_app",
        ])
        .assert()
        .success()
        .stdout(diff("requests\n"));
}

#[test]
fn closing_notice_is_always_printed() {
    let dir = tempdir().expect("tempdir should work");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).expect("mkdir should work");
    let sp = empty_site_packages(dir.path());
    let output = dir.path().join("requirements.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .args([
            "generate",
            src.to_str().expect("path utf8"),
            "--output",
            output.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(contains("import-to-distribution"));
}

#[test]
fn env_output_override_applies() {
    let dir = tempdir().expect("tempdir should work");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).expect("mkdir should work");
    let sp = empty_site_packages(dir.path());
    let env_output = dir.path().join("deps-from-env.txt");

    Command::new(assert_cmd::cargo::cargo_bin!("reqsift"))
        .env("REQSIFT_OUTPUT", env_output.to_str().expect("path utf8"))
        .args([
            "generate",
            src.to_str().expect("path utf8"),
            "--site-packages",
            sp.to_str().expect("path utf8"),
            "--pip",
            MISSING_PIP,
        ])
        .assert()
        .success();

    assert!(env_output.exists());
}
