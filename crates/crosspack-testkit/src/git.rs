use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

fn base_git_command() -> Command {
    let mut command = Command::new("git");
    command
        .arg("-c")
        .arg("core.autocrlf=false")
        .arg("-c")
        .arg("core.eol=lf")
        .arg("-c")
        .arg("init.defaultBranch=main")
        .arg("-c")
        .arg("commit.gpgsign=false")
        .arg("-c")
        .arg("user.name=crosspack-tests")
        .arg("-c")
        .arg("user.email=tests@crosspack.invalid");
    if cfg!(windows) {
        command.arg("-c").arg("core.longpaths=true");
    }
    command
}

/// Runs git quietly in `repo_root`; output is kept only for error messages.
pub(crate) fn run_git_command(repo_root: &Path, args: &[&str]) -> Result<()> {
    let output = base_git_command()
        .args(args)
        .current_dir(repo_root)
        .output()
        .with_context(|| format!("fixture-git-failed: failed launching git {}", args.join(" ")))?;
    if !output.status.success() {
        anyhow::bail!(
            "fixture-git-failed: git {} in {} failed: {}",
            args.join(" "),
            repo_root.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

pub(crate) fn commit_all(repo_root: &Path, message: &str) -> Result<()> {
    run_git_command(repo_root, &["add", "--all"])?;
    run_git_command(repo_root, &["commit", "--quiet", "--allow-empty", "-m", message])
}

pub fn git_available() -> bool {
    base_git_command()
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
