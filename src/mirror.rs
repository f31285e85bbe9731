//! Local mirror of the content repository.
//!
//! One branch, shallow, fast-forward only:
//!
//! ```text
//! no <dir>/.git ──▶ clone --depth 1 into .<dir>.partial ──▶ rename ──▶ Cloned
//! <dir>/.git    ──▶ fetch origin <branch> ──▶ merge --ff-only ──▶ Updated | UpToDate
//! ```
//!
//! Network work goes through the system `git` binary; HEAD and remote
//! inspection go through `gix`. An access token is sent as an HTTP basic-auth
//! header on each invocation and is never written into the remote URL or the
//! repository config.

use crate::exec;
use crate::log;
use crate::utils::exec::FilterRule;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use gix::{ObjectId, Repository, remote::Direction};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Routine git chatter on stderr.
const GIT_FILTER: FilterRule = FilterRule::new(&[
    "Cloning into",
    "From ",
    "* branch",
    "Updating ",
    "Fast-forward",
    "Already up to date",
    "remote:",
    "Receiving objects",
    "Resolving deltas",
    "Unpacking objects",
]);

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOp {
    Clone,
    Fetch,
    FastForward,
    SetUrl,
}

impl fmt::Display for GitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clone => "clone",
            Self::Fetch => "fetch",
            Self::FastForward => "merge --ff-only",
            Self::SetUrl => "remote set-url",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot inspect mirror directory `{0}`")]
    Inspect(PathBuf, #[source] io::Error),

    #[error("`{0}` exists and is not a git mirror; refusing to overwrite it")]
    NotAMirror(PathBuf),

    #[error("cannot open mirror `{0}`")]
    Open(PathBuf, #[source] Box<gix::open::Error>),

    #[error("cannot resolve HEAD of `{0}`")]
    Head(PathBuf, #[source] Box<gix::reference::head_id::Error>),

    #[error("git {op} failed for {url}: {detail}")]
    Git {
        op: GitOp,
        url: String,
        detail: String,
    },

    #[error("cannot move fresh clone into `{0}`")]
    Stage(PathBuf, #[source] io::Error),
}

// ============================================================================
// Sync outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Cloned { head: ObjectId },
    Updated { from: ObjectId, to: ObjectId },
    UpToDate { head: ObjectId },
}

impl SyncStatus {
    pub const fn head(&self) -> ObjectId {
        match *self {
            Self::Cloned { head } | Self::UpToDate { head } => head,
            Self::Updated { to, .. } => to,
        }
    }

    /// Whether the working tree changed in this sync.
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::UpToDate { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloned { head } => write!(f, "cloned at {}", head.to_hex_with_len(7)),
            Self::Updated { from, to } => write!(
                f,
                "updated {}..{}",
                from.to_hex_with_len(7),
                to.to_hex_with_len(7)
            ),
            Self::UpToDate { head } => write!(f, "up to date at {}", head.to_hex_with_len(7)),
        }
    }
}

// ============================================================================
// Mirror
// ============================================================================

pub struct Mirror {
    url: String,
    branch: String,
    dir: PathBuf,
    token: Option<String>,
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("dir", &self.dir)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Mirror {
    pub fn new(url: impl Into<String>, branch: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            dir: dir.into(),
            token: None,
        }
    }

    /// Authenticate HTTPS fetches with `token` (user `git`).
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A directory counts as a mirror once it has a `.git` entry.
    pub fn is_cloned(&self) -> Result<bool, SyncError> {
        match fs::symlink_metadata(self.dir.join(".git")) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::Inspect(self.dir.clone(), e)),
        }
    }

    /// Bring the local mirror in line with the configured branch.
    pub fn sync(&self) -> Result<SyncStatus, SyncError> {
        if self.is_cloned()? {
            self.pull()
        } else {
            self.clone_fresh()
        }
    }

    fn clone_fresh(&self) -> Result<SyncStatus, SyncError> {
        self.ensure_replaceable()?;

        let name = self
            .dir
            .file_name()
            .ok_or_else(|| SyncError::NotAMirror(self.dir.clone()))?;
        let parent = match self.dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| SyncError::Stage(parent.to_path_buf(), e))?;

        let mut staging_name = OsString::from(".");
        staging_name.push(name);
        staging_name.push(".partial");
        let staging = parent.join(staging_name);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| SyncError::Stage(staging.clone(), e))?;
        }

        log!("sync"; "cloning {} ({})", self.url, self.branch);
        let git = self.git_command();
        let cloned = exec!(
            filter=&GIT_FILTER; &git;
            "clone", "--depth", "1", "--single-branch", "--no-tags",
            "--branch", &self.branch, &self.url, &staging
        );
        if let Err(e) = cloned {
            // Nothing half-written is left behind for the next attempt to trip over.
            let _ = fs::remove_dir_all(&staging);
            return Err(self.git_error(GitOp::Clone, &e));
        }

        if self.dir.exists() {
            fs::remove_dir(&self.dir).map_err(|e| SyncError::Stage(self.dir.clone(), e))?;
        }
        fs::rename(&staging, &self.dir).map_err(|e| SyncError::Stage(self.dir.clone(), e))?;

        let head = head_of(&self.open()?, &self.dir)?;
        Ok(SyncStatus::Cloned { head })
    }

    fn pull(&self) -> Result<SyncStatus, SyncError> {
        let before = {
            let repo = self.open()?;
            self.ensure_origin(&repo)?;
            head_of(&repo, &self.dir)?
        };

        log!("sync"; "fetching {} ({})", self.url, self.branch);
        let git = self.git_command();
        exec!(filter=&GIT_FILTER; self.dir.as_path(); &git; "fetch", "--no-tags", "origin", &self.branch)
            .map_err(|e| self.git_error(GitOp::Fetch, &e))?;
        exec!(filter=&GIT_FILTER; self.dir.as_path(); &git; "merge", "--ff-only", "FETCH_HEAD")
            .map_err(|e| self.git_error(GitOp::FastForward, &e))?;

        let after = head_of(&self.open()?, &self.dir)?;
        if before == after {
            Ok(SyncStatus::UpToDate { head: after })
        } else {
            Ok(SyncStatus::Updated {
                from: before,
                to: after,
            })
        }
    }

    /// Only a missing or empty directory may be replaced by a fresh clone.
    fn ensure_replaceable(&self) -> Result<(), SyncError> {
        match fs::read_dir(&self.dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Err(SyncError::NotAMirror(self.dir.clone()));
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Inspect(self.dir.clone(), e)),
        }
    }

    fn open(&self) -> Result<Repository, SyncError> {
        gix::open(&self.dir).map_err(|e| SyncError::Open(self.dir.clone(), Box::new(e)))
    }

    /// Point `origin` at the configured URL if it moved since the clone.
    fn ensure_origin(&self, repo: &Repository) -> Result<(), SyncError> {
        if origin_matches(repo, &self.url) {
            return Ok(());
        }
        log!("sync"; "origin changed, now {}", self.url);
        exec!(filter=&GIT_FILTER; self.dir.as_path(); ["git"]; "remote", "set-url", "origin", &self.url)
            .map_err(|e| self.git_error(GitOp::SetUrl, &e))?;
        Ok(())
    }

    /// `git` plus the auth header option when a token is configured.
    fn git_command(&self) -> Vec<OsString> {
        let mut cmd = vec![OsString::from("git")];
        if let Some(token) = &self.token {
            let credentials = STANDARD.encode(format!("git:{token}"));
            cmd.push("-c".into());
            cmd.push(format!("http.extraHeader=Authorization: Basic {credentials}").into());
        }
        cmd
    }

    fn git_error(&self, op: GitOp, err: &anyhow::Error) -> SyncError {
        SyncError::Git {
            op,
            url: self.url.clone(),
            detail: format!("{err:#}"),
        }
    }
}

fn head_of(repo: &Repository, dir: &Path) -> Result<ObjectId, SyncError> {
    repo.head_id()
        .map(|id| id.detach())
        .map_err(|e| SyncError::Head(dir.to_path_buf(), Box::new(e)))
}

fn origin_matches(repo: &Repository, expected_url: &str) -> bool {
    repo.find_remote("origin")
        .ok()
        .and_then(|remote| {
            remote
                .url(Direction::Fetch)
                .map(|url| url.to_bstring() == expected_url)
        })
        .unwrap_or(false)
}
