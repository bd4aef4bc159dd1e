use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};

/// Get a Command for skillbench
pub fn skillbench() -> Command {
    cargo_bin_cmd!("skillbench")
}

/// Create a skill directory with a minimal SKILL.md
pub fn write_skill(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("SKILL.md"), "---\nname: calendar\n---\nManage meetings.\n").unwrap();
    dir
}

pub fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Executable shell script standing in for the agent binary
#[cfg(unix)]
pub fn write_agent(root: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = root.join("fake-agent.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
