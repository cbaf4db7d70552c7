use std::collections::BTreeMap;
use std::fs;
use std::panic::Location;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crosspack_core::PackageManifest;
use crosspack_registry::{write_renames, RegistryIndex, TapName, TapStore};
use tracing::debug;

use crate::environment::EnvOverrides;
use crate::git::{commit_all, run_git_command};
use crate::invoker::InvocationResult;
use crate::scenario::Scenario;

/// Digest recorded in `testball*` definitions.
pub const TESTBALL_SHA256: &str =
    "91e3f7930c98d7ccfb288e115ed52d06b0e5bc16fec7dce8bdda86530027067b";

const TESTBALL_TARBALL: &str = "testball-0.1.tbz";

/// Registry and tap fixtures rooted in one scenario's temp root.
#[derive(Debug, Clone, Copy)]
pub struct Fixtures<'a> {
    scenario: &'a Scenario,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapFixture {
    pub name: TapName,
    pub path: PathBuf,
    pub newly_installed: bool,
}

impl<'a> Fixtures<'a> {
    pub(crate) fn new(scenario: &'a Scenario) -> Self {
        Self { scenario }
    }

    pub fn registry(&self) -> RegistryIndex {
        RegistryIndex::open(self.scenario.registry_root())
    }

    /// `<fixture dir>/tarballs/testball-0.1.tbz`, when a fixture dir is configured.
    pub fn testball_tarball(&self) -> Option<PathBuf> {
        self.scenario
            .harness()
            .config()
            .fixture_dir()
            .map(|dir| dir.join("tarballs").join(TESTBALL_TARBALL))
    }

    /// Writes a package definition into the core registry.
    ///
    /// `testball*`, `foo` and `bar` get built-in templates; any other name
    /// gets a bare `1.0.0` definition. `body` is spliced in after the
    /// template's scalar keys, so it may add keys or tables of its own.
    pub fn setup_package_definition(&self, name: &str, body: Option<&str>) -> Result<PathBuf> {
        let testball_url = self
            .testball_tarball()
            .map(|path| format!("file://{}", path.to_string_lossy().replace('\\', "/")));
        let contents =
            definition_contents(name, body.unwrap_or_default(), testball_url.as_deref());
        let manifest = PackageManifest::from_toml_str(&contents)
            .with_context(|| format!("fixture definition for '{name}' is invalid"))?;

        let path = self
            .registry()
            .definition_path(&manifest.name, &manifest.version.to_string());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("failed to write definition: {}", path.display()))?;
        debug!(package = name, path = %path.display(), "package definition written");
        Ok(path)
    }

    /// Installs the tap `user/repo` as an empty local index, once.
    pub fn ensure_tap(&self, name: &str) -> Result<TapFixture> {
        let tap = TapName::parse(name)?;
        let store = TapStore::new(self.scenario.taps_root());
        let path = store.tap_path(&tap);
        let newly_installed = !store.is_installed(&tap);
        if newly_installed {
            let index_dir = store.index(&tap).index_dir();
            fs::create_dir_all(&index_dir)
                .with_context(|| format!("failed to create tap index: {}", index_dir.display()))?;
            debug!(tap = %tap, path = %path.display(), "tap installed");
        }
        Ok(TapFixture {
            name: tap,
            path,
            newly_installed,
        })
    }

    /// Installs `old_name`, then renames it to `new_name` in the core registry.
    ///
    /// Both states are committed to a git repository at the registry root.
    /// Returns the result of the install so callers can assert on it.
    #[track_caller]
    pub fn install_and_rename_package(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> Result<InvocationResult> {
        let location = Location::caller();
        let registry = self.registry();
        let root = registry.root().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create registry root: {}", root.display()))?;

        run_git_command(&root, &["init", "--quiet"])?;
        commit_all(
            &root,
            &format!("{} has not yet been renamed", capitalize(old_name)),
        )?;

        let installed = self.scenario.harness().run_at(
            location,
            vec!["install".to_string(), old_name.to_string()],
            &EnvOverrides::default(),
        )?;

        let old_dir = registry.package_dir(old_name);
        if old_dir.exists() {
            fs::remove_dir_all(&old_dir)
                .with_context(|| format!("failed to remove {}", old_dir.display()))?;
        }
        let renames = BTreeMap::from([(old_name.to_string(), new_name.to_string())]);
        write_renames(&root, &renames)?;

        commit_all(
            &root,
            &format!(
                "{} has been renamed to {}",
                capitalize(old_name),
                capitalize(new_name)
            ),
        )?;
        debug!(from = old_name, to = new_name, "package renamed");

        Ok(installed)
    }
}

fn definition_contents(name: &str, body: &str, testball_url: Option<&str>) -> String {
    let (scalars, tables) = if name.starts_with("testball") {
        let url = testball_url
            .map(|url| format!("url = \"{url}\"\n"))
            .unwrap_or_default();
        (
            format!(
                "name = \"{name}\"\n\
                 version = \"0.1.0\"\n\
                 description = \"Some test\"\n\
                 homepage = \"https://example.com/{name}\"\n\
                 {url}\
                 sha256 = \"{TESTBALL_SHA256}\"\n"
            ),
            "\n[[options]]\nname = \"with-foo\"\ndescription = \"Build with foo\"\n".to_string(),
        )
    } else if name == "foo" {
        (
            "name = \"foo\"\nversion = \"1.0.0\"\nurl = \"https://example.com/foo-1.0\"\n"
                .to_string(),
            String::new(),
        )
    } else if name == "bar" {
        (
            "name = \"bar\"\nversion = \"1.0.0\"\nurl = \"https://example.com/bar-1.0\"\n"
                .to_string(),
            "\n[dependencies]\nfoo = \"*\"\n".to_string(),
        )
    } else {
        (
            format!("name = \"{name}\"\nversion = \"1.0.0\"\n"),
            String::new(),
        )
    };

    let mut contents = scalars;
    if !body.is_empty() {
        contents.push_str(body);
        if !body.ends_with('\n') {
            contents.push('\n');
        }
    }
    contents.push_str(&tables);
    contents
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
