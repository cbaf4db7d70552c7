use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crosspack_core::env_vars::{BIN_FILE_ENV, TEST_TMPDIR_ENV};
use crosspack_core::PackageManifest;
use crosspack_installer::{
    current_unix_timestamp, install_package, installed_receipt, read_install_receipts,
    uninstall_package, InstallReason, PrefixLayout, UninstallStatus,
};
use crosspack_registry::{read_renames, resolve_renamed_name, PackageRef, RegistryIndex};
use tracing::debug;

use crate::render::{Status, TerminalRenderer};
use crate::roots::{resolve_roots, Roots};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let test_tmpdir = std::env::var_os(TEST_TMPDIR_ENV).map(PathBuf::from);
    let roots = resolve_roots(
        cli.prefix.as_deref(),
        cli.registry_root.as_deref(),
        test_tmpdir.as_deref(),
    )?;
    debug!(
        prefix = %roots.layout.prefix().display(),
        registry = %roots.registry.root().display(),
        "resolved roots"
    );
    let renderer = TerminalRenderer::current();

    match cli.command {
        Commands::Search { query } => {
            for name in roots.registry.search_names(&query)? {
                println!("{name}");
            }
        }
        Commands::Info { name } => {
            let lines = info_lines(&roots, &name)?;
            renderer.print_lines(&lines);
        }
        Commands::Install { names } => {
            for name in &names {
                install_requested(&roots, name, renderer)?;
            }
        }
        Commands::Uninstall { name } => {
            uninstall_requested(&roots.layout, &name, renderer)?;
        }
        Commands::List => {
            for receipt in read_install_receipts(&roots.layout)? {
                println!("{} {}", receipt.name, receipt.version);
            }
        }
        Commands::Doctor => {
            let bin_file = std::env::var_os(BIN_FILE_ENV).map(PathBuf::from);
            renderer.print_lines(&doctor_lines(&roots, bin_file.as_deref())?);
        }
    }

    Ok(())
}

pub(crate) fn info_lines(roots: &Roots, requested: &str) -> Result<Vec<String>> {
    let (index, name, _) = locate_package(roots, requested)?;
    let versions = index.package_versions(&name)?;
    let Some(latest) = versions.first() else {
        anyhow::bail!("package '{requested}' not found");
    };

    let mut lines = vec![format!("Package: {name}")];
    if let Some(description) = &latest.description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(homepage) = &latest.homepage {
        lines.push(format!("Homepage: {homepage}"));
    }
    for manifest in &versions {
        lines.push(format!("- {}", manifest.version));
    }
    for (dependency, requirement) in &latest.dependencies {
        lines.push(format!("depends on {dependency} ({requirement})"));
    }
    for option in &latest.options {
        lines.push(format!("--{}: {}", option.name, option.description));
    }
    Ok(lines)
}

pub(crate) fn install_requested(
    roots: &Roots,
    requested: &str,
    renderer: TerminalRenderer,
) -> Result<()> {
    let (index, name, source) = locate_package(roots, requested)?;
    if name != PackageRef::parse(requested)?.name() {
        renderer.print_status(
            Status::Warn,
            &format!("package '{requested}' was renamed to '{name}'"),
        );
    }

    let Some(manifest) = index.latest(&name)? else {
        anyhow::bail!("package '{requested}' not found");
    };
    if let Some(existing) = installed_receipt(&roots.layout, &name)? {
        if existing.version == manifest.version.to_string()
            && existing.install_reason == InstallReason::Root
        {
            renderer.print_status(
                Status::Warn,
                &format!("{} {} is already installed", existing.name, existing.version),
            );
            return Ok(());
        }
    }

    renderer.print_section(&format!("Installing {} {}", manifest.name, manifest.version));
    let mut visiting = Vec::new();
    install_with_dependencies(
        roots,
        &index,
        source.as_deref(),
        &manifest,
        InstallReason::Root,
        &mut visiting,
        renderer,
    )
}

fn install_with_dependencies(
    roots: &Roots,
    index: &RegistryIndex,
    source: Option<&str>,
    manifest: &PackageManifest,
    install_reason: InstallReason,
    visiting: &mut Vec<String>,
    renderer: TerminalRenderer,
) -> Result<()> {
    if visiting.contains(&manifest.name) {
        anyhow::bail!(
            "dependency cycle detected: {} -> {}",
            visiting.join(" -> "),
            manifest.name
        );
    }
    visiting.push(manifest.name.clone());

    for (dependency, requirement) in &manifest.dependencies {
        if let Some(existing) = installed_receipt(&roots.layout, dependency)? {
            let installed_version = semver::Version::parse(&existing.version).with_context(|| {
                format!("installed version of '{dependency}' is not valid semver")
            })?;
            if requirement.matches(&installed_version) {
                continue;
            }
        }

        let (dependency_index, dependency_source) = if index.latest(dependency)?.is_some() {
            (index.clone(), source)
        } else {
            (roots.registry.clone(), None)
        };
        let Some(dependency_manifest) = dependency_index
            .package_versions(dependency)?
            .into_iter()
            .find(|candidate| requirement.matches(&candidate.version))
        else {
            anyhow::bail!(
                "package '{dependency}' not found (required by '{}' as {requirement})",
                manifest.name
            );
        };
        install_with_dependencies(
            roots,
            &dependency_index,
            dependency_source,
            &dependency_manifest,
            InstallReason::Dependency,
            visiting,
            renderer,
        )?;
    }

    visiting.pop();
    let receipt = install_package(
        &roots.layout,
        manifest,
        install_reason,
        source,
        current_unix_timestamp()?,
    )?;
    renderer.print_status(
        Status::Ok,
        &format!("installed {} {}", receipt.name, receipt.version),
    );
    Ok(())
}

/// Resolves a requested name to the index holding it, following core renames.
fn locate_package(
    roots: &Roots,
    requested: &str,
) -> Result<(RegistryIndex, String, Option<String>)> {
    match PackageRef::parse(requested)? {
        PackageRef::Core(name) => {
            let renames = read_renames(roots.registry.root())?;
            let resolved = resolve_renamed_name(&renames, &name)?;
            Ok((roots.registry.clone(), resolved, None))
        }
        PackageRef::Tapped { tap, name } => {
            if !roots.taps.is_installed(&tap) {
                anyhow::bail!("tap '{tap}' is not installed");
            }
            Ok((roots.taps.index(&tap), name, Some(tap.to_string())))
        }
    }
}

pub(crate) fn uninstall_requested(
    layout: &PrefixLayout,
    name: &str,
    renderer: TerminalRenderer,
) -> Result<()> {
    let result = uninstall_package(layout, name)?;
    match result.status {
        UninstallStatus::NotInstalled => {
            anyhow::bail!("package '{name}' is not installed");
        }
        UninstallStatus::BlockedByDependents => {
            anyhow::bail!(
                "cannot uninstall '{name}': required by {}",
                result.blocked_by_roots.join(", ")
            );
        }
        UninstallStatus::Uninstalled => {
            let version = result.version.unwrap_or_default();
            renderer.print_status(Status::Ok, &format!("uninstalled {name} {version}"));
            for pruned in &result.pruned_dependencies {
                renderer.print_status(Status::Ok, &format!("pruned dependency {pruned}"));
            }
        }
    }
    Ok(())
}

pub(crate) fn doctor_lines(roots: &Roots, bin_file: Option<&Path>) -> Result<Vec<String>> {
    let mut lines = vec![
        format!("prefix: {}", roots.layout.prefix().display()),
        format!("registry: {}", roots.registry.root().display()),
        format!("taps: {}", roots.taps.root().display()),
    ];
    for tap in roots.taps.installed_taps()? {
        lines.push(format!("tap: {tap}"));
    }
    if let Some(bin_file) = bin_file {
        if !bin_file.is_file() {
            anyhow::bail!("{BIN_FILE_ENV} points at a missing file: {}", bin_file.display());
        }
        lines.push(format!("bin file: {}", bin_file.display()));
    }
    Ok(lines)
}
