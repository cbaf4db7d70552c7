use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stands in for the run's temp root inside identifiers.
pub const TMPDIR_PLACEHOLDER: &str = "@TMPDIR@";

/// Run-scoped invocation counter.
///
/// Starts at zero and is incremented exactly once per invocation; it is never
/// reset, so identifiers stay unique even when call site and arguments repeat.
#[derive(Debug, Default)]
pub struct CallCounter {
    count: AtomicU64,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the post-increment value.
    pub fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub file: &'a str,
    pub line: u32,
}

impl<'a> From<&'a Location<'a>> for CallSite<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// Both spellings of a run's temp root, resolved once per harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempRoot {
    literal: String,
    canonical: Option<String>,
}

impl TempRoot {
    /// Resolves the canonical form of `path`; this is the only filesystem
    /// access behind identifier generation.
    pub fn resolve(path: &Path) -> Self {
        let canonical = path
            .canonicalize()
            .ok()
            .map(|canonical| canonical.to_string_lossy().into_owned());
        Self::from_parts(path, canonical)
    }

    pub fn from_parts(literal: &Path, canonical: Option<String>) -> Self {
        let literal = literal.to_string_lossy().into_owned();
        let canonical = canonical.filter(|canonical| *canonical != literal);
        Self { literal, canonical }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    fn mask(&self, joined: &str) -> String {
        let mut masked = joined.to_string();
        if let Some(canonical) = &self.canonical {
            masked = replace_non_empty(&masked, canonical);
        }
        replace_non_empty(&masked, &self.literal)
    }
}

/// Builds `path:line:program args:sequence` for one invocation.
///
/// Both forms of `tmp_root` are replaced with [`TMPDIR_PLACEHOLDER`] and
/// everything up to and including `suite_root` is trimmed from the call-site
/// path. Pure string work.
pub fn command_id(
    call_site: CallSite<'_>,
    program: &str,
    args: &[String],
    tmp_root: &TempRoot,
    suite_root: &str,
    sequence: u64,
) -> String {
    let pretty_args = tmp_root.mask(&args.join(" "));
    format!(
        "{}:{}:{program} {pretty_args}:{sequence}",
        trim_suite_root(call_site.file, suite_root),
        call_site.line
    )
}

fn replace_non_empty(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    haystack.replace(needle, TMPDIR_PLACEHOLDER)
}

fn trim_suite_root<'a>(file: &'a str, suite_root: &str) -> &'a str {
    if suite_root.is_empty() {
        return file;
    }
    match file.find(suite_root) {
        Some(start) => &file[start + suite_root.len()..],
        None => file,
    }
}
