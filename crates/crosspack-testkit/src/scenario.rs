use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::command_id::CallCounter;
use crate::config::HarnessConfig;
use crate::fixtures::Fixtures;
use crate::harness::Harness;

/// One test scenario bracketed by before/after hooks.
///
/// [`Scenario::begin`] creates `<prefix>/bin/crosspack` as an empty
/// placeholder. Dropping the scenario removes that file and then its `bin`
/// directory, on every exit path including a panicking test body.
#[derive(Debug)]
pub struct Scenario {
    harness: Harness,
    bin_file: PathBuf,
    root: ScenarioRoot,
}

#[derive(Debug)]
enum ScenarioRoot {
    Owned(TempDir),
    Borrowed(PathBuf),
}

impl ScenarioRoot {
    fn path(&self) -> &Path {
        match self {
            Self::Owned(dir) => dir.path(),
            Self::Borrowed(path) => path,
        }
    }
}

impl Scenario {
    /// Starts a scenario in a fresh temp root owned by the scenario.
    pub fn begin(config: impl Into<Arc<HarnessConfig>>, counter: Arc<CallCounter>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("crosspack-test-")
            .tempdir()
            .context("failed to create scenario temp root")?;
        Self::with_root(ScenarioRoot::Owned(dir), config.into(), counter)
    }

    /// Starts a scenario in an existing root the caller keeps ownership of.
    pub fn begin_in(
        root: impl Into<PathBuf>,
        config: impl Into<Arc<HarnessConfig>>,
        counter: Arc<CallCounter>,
    ) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create scenario root: {}", root.display()))?;
        Self::with_root(ScenarioRoot::Borrowed(root), config.into(), counter)
    }

    fn with_root(
        root: ScenarioRoot,
        config: Arc<HarnessConfig>,
        counter: Arc<CallCounter>,
    ) -> Result<Self> {
        let tmp_root = root.path().to_path_buf();
        let bin_file = scenario_bin_file(&tmp_root);
        let bin_dir = bin_file
            .parent()
            .map(Path::to_path_buf)
            .context("placeholder bin file has no parent")?;

        fs::create_dir_all(&bin_dir)
            .with_context(|| format!("failed to create {}", bin_dir.display()))?;
        fs::write(&bin_file, b"")
            .with_context(|| format!("failed to create {}", bin_file.display()))?;
        debug!(bin_file = %bin_file.display(), "scenario placeholder created");

        Ok(Self {
            harness: Harness::new(config, counter, &tmp_root, &bin_file),
            bin_file,
            root,
        })
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub fn fixtures(&self) -> Fixtures<'_> {
        Fixtures::new(self)
    }

    pub fn tmp_root(&self) -> &Path {
        self.root.path()
    }

    pub fn prefix(&self) -> PathBuf {
        self.tmp_root().join("prefix")
    }

    pub fn registry_root(&self) -> PathBuf {
        self.tmp_root().join("registry")
    }

    pub fn taps_root(&self) -> PathBuf {
        self.tmp_root().join("taps")
    }

    pub fn bin_file(&self) -> &Path {
        &self.bin_file
    }
}

impl Drop for Scenario {
    fn drop(&mut self) {
        if let Err(err) = remove_placeholder(&self.bin_file) {
            warn!(
                bin_file = %self.bin_file.display(),
                error = %err,
                "failed to remove scenario placeholder"
            );
        }
    }
}

/// Runs `body` as a scenario; the after-hook runs even if `body` panics.
pub fn run_scenario<T>(
    config: impl Into<Arc<HarnessConfig>>,
    counter: Arc<CallCounter>,
    body: impl FnOnce(&Scenario) -> T,
) -> Result<T> {
    let scenario = Scenario::begin(config, counter)?;
    Ok(body(&scenario))
}

fn scenario_bin_file(tmp_root: &Path) -> PathBuf {
    tmp_root.join("prefix").join("bin").join("crosspack")
}

fn remove_placeholder(bin_file: &Path) -> io::Result<()> {
    match fs::remove_file(bin_file) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    if let Some(bin_dir) = bin_file.parent() {
        match fs::remove_dir(bin_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
