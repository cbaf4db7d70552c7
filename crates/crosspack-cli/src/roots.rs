use std::path::{Path, PathBuf};

use anyhow::Result;
use crosspack_installer::{default_user_prefix, PrefixLayout};
use crosspack_registry::{RegistryIndex, TapStore};

/// Filesystem roots a single command operates on.
#[derive(Debug, Clone)]
pub(crate) struct Roots {
    pub(crate) layout: PrefixLayout,
    pub(crate) registry: RegistryIndex,
    pub(crate) taps: TapStore,
}

/// Explicit roots win; otherwise a test temp root relocates everything under
/// it; otherwise the user prefix holds the registry and taps.
pub(crate) fn resolve_roots(
    prefix: Option<&Path>,
    registry_root: Option<&Path>,
    test_tmpdir: Option<&Path>,
) -> Result<Roots> {
    let base = match test_tmpdir {
        Some(tmpdir) => RootBase::TestTmpdir(tmpdir.to_path_buf()),
        None => RootBase::UserPrefix(default_user_prefix()?),
    };

    let prefix = prefix
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base.prefix());
    let registry_root = registry_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base.join("registry"));

    Ok(Roots {
        layout: PrefixLayout::new(prefix),
        registry: RegistryIndex::open(registry_root),
        taps: TapStore::new(base.join("taps")),
    })
}

enum RootBase {
    TestTmpdir(PathBuf),
    UserPrefix(PathBuf),
}

impl RootBase {
    fn prefix(&self) -> PathBuf {
        match self {
            Self::TestTmpdir(tmpdir) => tmpdir.join("prefix"),
            Self::UserPrefix(prefix) => prefix.clone(),
        }
    }

    fn join(&self, child: &str) -> PathBuf {
        match self {
            Self::TestTmpdir(root) | Self::UserPrefix(root) => root.join(child),
        }
    }
}
