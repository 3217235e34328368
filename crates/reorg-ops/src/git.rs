//! Git working trees via libgit2.

use std::path::{Path, PathBuf};

use git2::{
    Cred, CredentialType, ErrorCode, IndexAddOption, PushOptions, RemoteCallbacks, Signature,
    StatusOptions,
};

use reorg_core::{Repository, RepositoryOpener, VcsError};

/// A git repository whose working tree root is a tracked directory.
pub struct GitRepository {
    repo: git2::Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open the repository rooted exactly at `path`. Parent directories are
    /// not searched.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let repo = git2::Repository::open(path)
            .map_err(|e| VcsError::new(path, "open", e.message()))?;
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    fn error(&self, action: &'static str, err: git2::Error) -> VcsError {
        VcsError::new(&self.path, action, err.message())
    }

    fn signature(&self) -> Result<Signature<'static>, git2::Error> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Signature::now("reorg", "reorg@localhost"),
        }
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        let head = self.repo.head().map_err(|e| self.error("push", e))?;
        if !head.is_branch() {
            return Err(VcsError::new(&self.path, "push", "HEAD is detached"));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| VcsError::new(&self.path, "push", "branch name is not UTF-8"))
    }

    fn remote_name(&self, branch: &str) -> String {
        self.repo
            .branch_upstream_remote(&format!("refs/heads/{branch}"))
            .ok()
            .and_then(|buf| buf.as_str().map(str::to_string))
            .unwrap_or_else(|| "origin".to_string())
    }
}

impl Repository for GitRepository {
    fn has_pending_changes(&self) -> Result<bool, VcsError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| self.error("status", e))?;
        Ok(!statuses.is_empty())
    }

    fn commit_all(&self, message: &str) -> Result<(), VcsError> {
        let commit = || -> Result<git2::Oid, git2::Error> {
            let mut index = self.repo.index()?;
            index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
            index.update_all(["*"].iter(), None)?;
            index.write()?;

            let tree = self.repo.find_tree(index.write_tree()?)?;
            let sig = self.signature()?;

            let parent = match self.repo.head() {
                Ok(head) => Some(head.peel_to_commit()?),
                Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                    None
                }
                Err(e) => return Err(e),
            };
            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        };

        let oid = commit().map_err(|e| self.error("commit", e))?;
        tracing::info!(path = %self.path.display(), commit = %oid, "Committed");
        Ok(())
    }

    fn push(&self) -> Result<(), VcsError> {
        let branch = self.current_branch()?;
        let remote_name = self.remote_name(&branch);
        let mut remote = self
            .repo
            .find_remote(&remote_name)
            .map_err(|e| self.error("push", e))?;
        let config = self.repo.config().map_err(|e| self.error("push", e))?;

        let mut rejected: Option<String> = None;
        {
            let mut attempts = CredentialAttempts::new(&config);
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(move |url, username, allowed| {
                attempts.next(url, username, allowed)
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(msg) = status {
                    rejected = Some(format!("{refname}: {msg}"));
                }
                Ok(())
            });

            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);

            let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
            remote
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|e| self.error("push", e))?;
        }

        if let Some(reason) = rejected {
            return Err(VcsError::new(&self.path, "push", reason));
        }

        tracing::info!(path = %self.path.display(), remote = %remote_name, %branch, "Pushed");
        Ok(())
    }
}

/// Credentials offered to a remote during one push.
///
/// libgit2 asks again after every rejected credential. Each kind is offered
/// at most once, so a rejection ends the push with an error.
struct CredentialAttempts<'a> {
    config: &'a git2::Config,
    tried: CredentialType,
}

impl<'a> CredentialAttempts<'a> {
    fn new(config: &'a git2::Config) -> Self {
        Self {
            config,
            tried: CredentialType::empty(),
        }
    }

    fn next(
        &mut self,
        url: &str,
        username: Option<&str>,
        allowed: CredentialType,
    ) -> Result<Cred, git2::Error> {
        let kind = [
            CredentialType::USERNAME,
            CredentialType::SSH_KEY,
            CredentialType::USER_PASS_PLAINTEXT,
        ]
        .into_iter()
        .find(|kind| allowed.contains(*kind))
        .unwrap_or(CredentialType::DEFAULT);

        if self.tried.contains(kind) {
            return Err(git2::Error::from_str(&format!(
                "authentication failed for {url}"
            )));
        }
        self.tried.insert(kind);

        let user = username.unwrap_or("git");
        if kind.contains(CredentialType::USERNAME) {
            Cred::username(user)
        } else if kind.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(user)
        } else if kind.contains(CredentialType::USER_PASS_PLAINTEXT) {
            Cred::credential_helper(self.config, url, username)
        } else {
            Cred::default()
        }
    }
}

/// Opens git repositories at tracked directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitOpener;

impl RepositoryOpener for GitOpener {
    fn open(&self, dir: &Path) -> Option<Box<dyn Repository>> {
        match GitRepository::open(dir) {
            Ok(repo) => Some(Box::new(repo)),
            Err(e) => {
                tracing::debug!("{e}");
                None
            }
        }
    }
}
