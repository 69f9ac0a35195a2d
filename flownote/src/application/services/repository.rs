//! Dataset repository operations on top of git and dvc
//!
//! git tracks history, tags and the small `.dvc` pointer files; dvc tracks
//! the payloads. Each operation is a straight sequence of external calls that
//! stops at the first failure.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::archive::ArchiveService;
use crate::application::services::runner::{dvc, git, ProcessRunner};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{self, RemoteKind};
use crate::infrastructure::traits::FileSystem;

/// git/dvc repository service.
pub struct RepositoryService {
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
    archive: ArchiveService,
    settings: Arc<Settings>,
}

impl RepositoryService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: ProcessRunner,
        archive: ArchiveService,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            runner,
            archive,
            settings,
        }
    }

    /// Initialize whichever of git and dvc is not yet set up.
    #[instrument(skip(self))]
    pub fn init(&self) -> ApplicationResult<()> {
        let workdir = self.runner.workdir();
        if !self.fs.exists(&workdir.join(".git")) {
            self.runner.run(git(["init"]), "git init failed")?;
        }
        if !self.fs.exists(&workdir.join(".dvc")) {
            self.runner.run(dvc(["init"]), "dvc init failed")?;
        }
        Ok(())
    }

    /// Replace the configured remote of git or dvc.
    #[instrument(skip(self))]
    pub fn set_remote(&self, kind: RemoteKind, url: &str) -> ApplicationResult<()> {
        let remote = self.settings.remote.as_str();
        match kind {
            RemoteKind::Metadata => {
                self.runner.run_tolerant(git(["remote", "remove", remote]));
                self.runner
                    .run(git(["remote", "add", remote, url]), "git remote add failed")
            }
            RemoteKind::Data => {
                self.runner.run_tolerant(dvc(["remote", "remove", remote]));
                self.runner.run(
                    dvc(["remote", "add", "-d", remote, url]),
                    "dvc remote add failed",
                )
            }
        }
    }

    /// Print the remotes of both tools.
    pub fn list_remotes(&self) -> ApplicationResult<()> {
        self.runner
            .run(git(["remote", "-v"]), "git remote failed")?;
        self.runner
            .run(dvc(["remote", "list"]), "dvc remote list failed")
    }

    /// Track targets with dvc, packing each one first when `zip` is set.
    ///
    /// # Returns
    /// The paths handed to `dvc add`
    #[instrument(skip(self))]
    pub fn add(&self, targets: &[String], zip: bool) -> ApplicationResult<Vec<String>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let tracked: Vec<String> = if zip {
            let mut archives = Vec::with_capacity(targets.len());
            for target in targets {
                self.archive.pack(&self.runner.workdir().join(target))?;
                let archive = domain::archive_path(std::path::Path::new(target));
                archives.push(archive.to_string_lossy().into_owned());
            }
            archives
        } else {
            targets.to_vec()
        };

        self.runner
            .run(dvc(["add"]).args(tracked.iter().cloned()), "dvc add failed")?;
        Ok(tracked)
    }

    /// Stop tracking targets; each one is normalized to its `.dvc` pointer.
    #[instrument(skip(self))]
    pub fn remove(&self, targets: &[String]) -> ApplicationResult<Vec<String>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let pointers: Vec<String> = targets.iter().map(|t| domain::with_data_suffix(t)).collect();
        self.runner.run(
            dvc(["remove", "-p", "-f"]).args(pointers.iter().cloned()),
            "dvc remove failed",
        )?;
        Ok(pointers)
    }

    pub fn clone_repository(&self, url: &str, output_dir: Option<&str>) -> ApplicationResult<()> {
        self.runner.run(
            git(["clone", url]).args(output_dir),
            "git clone failed",
        )
    }

    /// Stage new/modified pointer and ignore files and commit them.
    ///
    /// # Returns
    /// The files that were staged
    #[instrument(skip(self))]
    pub fn commit(&self, message: &str) -> ApplicationResult<Vec<String>> {
        if message.trim().is_empty() {
            return Err(ApplicationError::Invalid("missing commit message".into()));
        }

        let listing = self.runner.capture(
            git(["ls-files", "-z", "--other", "--modified", "--exclude-standard"]),
            "git ls-files failed",
        )?;
        let mut staged: Vec<String> = Vec::new();
        for path in nul_separated(&listing) {
            if domain::is_commit_candidate(path) && !staged.iter().any(|s| s == path) {
                staged.push(path.to_string());
            }
        }
        debug!("commit: staging {:?}", staged);

        if !staged.is_empty() {
            self.runner
                .run(git(["add", "--"]).args(staged.iter().cloned()), "git add failed")?;
        }
        self.runner
            .run(git(["commit", "-m", message]), "git commit failed")?;
        Ok(staged)
    }

    /// Most recently created tag, if any.
    fn latest_tag(&self) -> ApplicationResult<Option<String>> {
        let output = self.runner.capture(
            git([
                "for-each-ref",
                "--sort=-creatordate",
                "--count=1",
                "--format=%(refname:short)",
                "refs/tags",
            ]),
            "git for-each-ref failed",
        )?;
        Ok(output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string))
    }

    /// Publish a new dataset version.
    ///
    /// Merges upstream (keeping local changes on conflict) unless `skip_merge`,
    /// tags the next version, pushes branch and tag, then pushes dvc data.
    ///
    /// # Returns
    /// The new version number
    #[instrument(skip(self))]
    pub fn push(&self, message: Option<&str>, skip_merge: bool) -> ApplicationResult<u64> {
        if !skip_merge {
            self.runner
                .run(git(["pull", "-X", "ours", "--no-edit"]), "git pull failed")?;
        }

        let latest = self.latest_tag()?;
        let version = domain::next_version(latest.as_deref());
        let tag = version.to_string();
        debug!("push: latest tag {:?}, next {}", latest, tag);
        let tag_message = message.filter(|m| !m.trim().is_empty()).unwrap_or(&tag);

        self.runner.run(
            git(["tag", "-a", tag.as_str(), "-m", tag_message]),
            "git tag failed",
        )?;

        let branch = self.runner.capture(
            git(["rev-parse", "--abbrev-ref", "HEAD"]),
            "git rev-parse failed",
        )?;
        let branch = branch.trim();
        let remote = self.settings.remote.as_str();

        self.runner
            .run(git(["push", remote, branch]), "git push failed")?;
        self.runner
            .run(git(["push", remote, tag.as_str()]), "git push tag failed")?;
        self.runner.run(dvc(["push"]), "dvc push failed")?;
        Ok(version)
    }

    /// Switch to a version (default: the main branch) and sync its data.
    #[instrument(skip(self))]
    pub fn checkout(&self, reference: Option<&str>, unzip: bool) -> ApplicationResult<()> {
        let reference = reference.unwrap_or(&self.settings.main_branch);
        self.runner
            .run(git(["checkout", reference]), "git checkout failed")?;
        self.runner
            .run(git(["clean", "-fd"]), "git clean failed")?;

        let remotes = self
            .runner
            .capture(dvc(["remote", "list"]), "dvc remote list failed")?;
        if remotes.trim().is_empty() {
            debug!("checkout: no dvc remote, skipping dvc pull");
        } else {
            self.runner.run(dvc(["pull"]), "dvc pull failed")?;
        }
        self.runner
            .run(dvc(["checkout"]), "dvc checkout failed")?;

        if unzip {
            self.unpack_tracked_archives()?;
        }
        Ok(())
    }

    /// Pull the main branch with tags, then the dvc data.
    #[instrument(skip(self))]
    pub fn pull(&self, unzip: bool) -> ApplicationResult<()> {
        let remote = self.settings.remote.as_str();
        self.runner.run(
            git(["pull", remote, self.settings.main_branch.as_str(), "--tags"]),
            "git pull failed",
        )?;
        self.runner.run(dvc(["pull"]), "dvc pull failed")?;

        if unzip {
            self.unpack_tracked_archives()?;
        }
        Ok(())
    }

    fn tracked_files(&self) -> ApplicationResult<Vec<String>> {
        let listing = self
            .runner
            .capture(git(["ls-files", "-z"]), "git ls-files failed")?;
        Ok(nul_separated(&listing).map(str::to_string).collect())
    }

    /// Unpack every archive behind a tracked `*.zip.dvc` pointer.
    ///
    /// # Returns
    /// The archives that were unpacked
    pub fn unpack_tracked_archives(&self) -> ApplicationResult<Vec<PathBuf>> {
        let workdir = self.runner.workdir();
        let archives: Vec<PathBuf> = self
            .tracked_files()?
            .iter()
            .filter_map(|f| domain::archive_from_tracking_file(f))
            .map(|a| workdir.join(a))
            .collect();
        debug!("unpack_tracked_archives: {:?}", archives);
        self.archive.unpack(&archives)
    }

    /// Data targets tracked through dvc pointer files.
    pub fn list_tracked(&self) -> ApplicationResult<Vec<String>> {
        Ok(self
            .tracked_files()?
            .iter()
            .filter_map(|f| domain::tracked_data_target(f))
            .map(str::to_string)
            .collect())
    }

    pub fn version(&self) -> ApplicationResult<()> {
        self.runner
            .run(git(["describe", "--tags"]), "git describe failed")
    }

    pub fn versions(&self) -> ApplicationResult<()> {
        self.runner.run(
            git([
                "for-each-ref",
                "--sort=-creatordate",
                "--format=%(refname:short) | %(subject)",
                "refs/tags",
            ]),
            "git for-each-ref failed",
        )
    }
}

/// Paths from `git ls-files -z` output, which never quotes non-ASCII names.
fn nul_separated(listing: &str) -> impl Iterator<Item = &str> {
    listing.split('\0').filter(|path| !path.is_empty())
}
