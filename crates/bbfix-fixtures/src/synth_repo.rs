//! Synthetic git repositories used by `bbfix-core` integration tests: real
//! working trees under a temp dir, built with the real `git` binary so the
//! Risk Snapshot Collector and Apply Pipeline exercise actual porcelain
//! output rather than hand-written fixtures.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Git(String),
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "IO error: {e}"),
            FixtureError::Git(msg) => write!(f, "Git error: {msg}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<std::io::Error> for FixtureError {
    fn from(e: std::io::Error) -> Self {
        FixtureError::Io(e)
    }
}

pub struct SynthRepo {
    pub path: PathBuf,
    _tempdir: tempfile::TempDir,
}

impl SynthRepo {
    /// A fresh repo with one commit and no remote, isolated in its own
    /// temp directory so parallel tests never collide.
    pub fn bare_clean() -> Result<Self, FixtureError> {
        let tempdir = tempfile::tempdir()?;
        let path = tempdir.path().join("repo");
        fs::create_dir_all(&path)?;
        let repo = SynthRepo {
            path,
            _tempdir: tempdir,
        };
        repo.run_git(&["init", "-q", "-b", "main"])?;
        repo.run_git(&["config", "user.name", "Test User"])?;
        repo.run_git(&["config", "user.email", "test@example.com"])?;
        repo.write_file("README.md", "hello\n")?;
        repo.run_git(&["add", "."])?;
        repo.run_git(&["commit", "-q", "-m", "initial commit"])?;
        Ok(repo)
    }

    /// `bare_clean` plus a bare remote at `origin`, cloned-style (push access
    /// granted).
    pub fn with_origin() -> Result<(Self, PathBuf), FixtureError> {
        let repo = Self::bare_clean()?;
        let remote_dir = repo._tempdir.path().join("origin.git");
        Command::new("git")
            .args(["init", "-q", "--bare", "-b", "main"])
            .arg(&remote_dir)
            .output()?;
        repo.run_git(&["remote", "add", "origin", remote_dir.to_str().unwrap()])?;
        repo.run_git(&["push", "-q", "-u", "origin", "main"])?;
        Ok((repo, remote_dir))
    }

    pub fn write_file(&self, rel_path: &str, content: &str) -> Result<(), FixtureError> {
        let full_path = self.path.join(rel_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&full_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn run_git(&self, args: &[&str]) -> Result<(), FixtureError> {
        let output = Command::new("git").current_dir(&self.path).args(args).output()?;
        if !output.status.success() {
            return Err(FixtureError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    /// Dirties the tree: modifies the tracked file and adds an untracked one.
    pub fn make_dirty(&self) -> Result<(), FixtureError> {
        self.write_file("README.md", "hello\nmodified\n")?;
        self.write_file("scratch.txt", "untracked\n")?;
        Ok(())
    }

    pub fn add_secret_file(&self) -> Result<(), FixtureError> {
        self.write_file(".env", "SECRET=shh\n")
    }

    pub fn add_noisy_dir(&self) -> Result<(), FixtureError> {
        self.write_file("node_modules/pkg/index.js", "module.exports = {};\n")
    }

    /// Commits `n` local commits without pushing, so `ahead == n`.
    pub fn make_ahead(&self, n: u32) -> Result<(), FixtureError> {
        for i in 0..n {
            self.write_file(&format!("ahead-{i}.txt"), "local only\n")?;
            self.run_git(&["add", "."])?;
            self.run_git(&["commit", "-q", "-m", &format!("local commit {i}")])?;
        }
        Ok(())
    }

    /// Starts a merge that will conflict, leaving the repo mid-merge.
    pub fn begin_conflicting_merge(&self, remote_dir: &std::path::Path) -> Result<(), FixtureError> {
        self.write_file("README.md", "hello\nlocal edit\n")?;
        self.run_git(&["add", "."])?;
        self.run_git(&["commit", "-q", "-m", "local edit"])?;

        let other = self.path.parent().unwrap().join("other-clone");
        Command::new("git")
            .args(["clone", "-q"])
            .arg(remote_dir)
            .arg(&other)
            .output()?;
        fs::write(other.join("README.md"), "hello\nremote edit\n")?;
        Command::new("git")
            .current_dir(&other)
            .args(["commit", "-aq", "-m", "remote edit"])
            .output()?;
        Command::new("git")
            .current_dir(&other)
            .args(["push", "-q"])
            .output()?;

        self.run_git(&["fetch", "-q", "origin"])?;
        let _ = Command::new("git")
            .current_dir(&self.path)
            .args(["merge", "origin/main"])
            .output()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_clean_has_one_commit_and_no_remote() {
        let repo = SynthRepo::bare_clean().unwrap();
        assert!(repo.path.join(".git").exists());
        assert!(repo.path.join("README.md").exists());
    }

    #[test]
    fn with_origin_pushes_initial_commit() {
        let (repo, remote) = SynthRepo::with_origin().unwrap();
        assert!(remote.exists());
        assert!(repo.path.join(".git").exists());
    }

    #[test]
    fn make_dirty_creates_tracked_and_untracked_changes() {
        let repo = SynthRepo::bare_clean().unwrap();
        repo.make_dirty().unwrap();
        assert!(repo.path.join("scratch.txt").exists());
    }
}
