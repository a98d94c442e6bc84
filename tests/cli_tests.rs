//! End-to-end tests of the bulkclip binary

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary isolated from the caller's environment and config files
fn bulkclip(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bulkclip").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .env_remove("BULKCLIP_CONFIG")
        .env_remove("BULKCLIP_LOG_LEVEL")
        .env_remove("BULKCLIP_FFMPEG")
        .env_remove("BULKCLIP_FFPROBE")
        .env_remove("BULKCLIP_HW_ENCODER")
        .env_remove("BULKCLIP_ON_FAILURE");
    cmd
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("src.mp4"), b"media").unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    dir
}

#[test]
fn test_help_lists_commands() {
    let dir = workspace();
    bulkclip(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clip"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("encoders"));
}

#[test]
fn test_malformed_range_is_rejected() {
    let dir = workspace();
    bulkclip(dir.path())
        .args(["clip", "-i", "src.mp4", "-o", "out", "--range", "1:xx-2:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid range"));
}

#[test]
fn test_missing_input_is_reported() {
    let dir = workspace();
    bulkclip(dir.path())
        .args(["clip", "-i", "absent.mp4", "-o", "out", "--range", "0:10-0:20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_probe_of_missing_file_fails() {
    let dir = workspace();
    bulkclip(dir.path())
        .args(["probe", "-i", "absent.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not determine duration"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = workspace();
    std::fs::write(dir.path().join("bulkclip.toml"), "[logging]\nlevel = \"loud\"\n").unwrap();
    bulkclip(dir.path())
        .args(["encoders"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid logging.level"));
}

#[test]
fn test_encoders_from_config() {
    let dir = workspace();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[encoding]\navailable_encoders = [\"nvenc\"]\n").unwrap();
    bulkclip(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["encoders", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("h264_nvenc"))
        .stdout(predicate::str::contains("\"verified\": true"));
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_clip_batch_end_to_end() {
        let dir = workspace();
        let ffmpeg = script(dir.path(), "fake-ffmpeg", "for last; do :; done\n: > \"$last\"");
        let ffprobe = script(dir.path(), "fake-ffprobe", "echo 120.0");

        bulkclip(dir.path())
            .arg("--ffmpeg")
            .arg(&ffmpeg)
            .arg("--ffprobe")
            .arg(&ffprobe)
            .args([
                "clip",
                "-i",
                "src.mp4",
                "-o",
                "out",
                "--ranges",
                "0:10-0:20, 1:00-1:30",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Video clipping completed!"));

        assert!(dir.path().join("out/Clip_1_src.mp4").is_file());
        assert!(dir.path().join("out/Clip_2_src.mp4").is_file());
    }

    #[test]
    fn test_failing_ffmpeg_exits_nonzero() {
        let dir = workspace();
        let ffmpeg = script(dir.path(), "fake-ffmpeg", "echo 'Error: no space left' >&2\nexit 1");
        let ffprobe = script(dir.path(), "fake-ffprobe", "echo 120.0");

        bulkclip(dir.path())
            .arg("--ffmpeg")
            .arg(&ffmpeg)
            .arg("--ffprobe")
            .arg(&ffprobe)
            .args(["clip", "-i", "src.mp4", "-o", "out", "--range", "0:10-0:20"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "Error processing clip 1: Error: no space left",
            ));
        assert!(!dir.path().join("out/Clip_1_src.mp4").exists());
    }

    #[test]
    fn test_probe_prints_duration() {
        let dir = workspace();
        let ffprobe = script(dir.path(), "fake-ffprobe", "echo 75.5");

        bulkclip(dir.path())
            .arg("--ffprobe")
            .arg(&ffprobe)
            .args(["probe", "-i", "src.mp4"])
            .assert()
            .success()
            .stdout(predicate::str::contains("00:01:15"));
    }
}
