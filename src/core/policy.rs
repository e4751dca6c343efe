//! Traversal rules: which entries a folder-size scan skips
//!
//! Whole-folder measurement and measurement filtered by file type use the same
//! [`SkipPolicy`] type with different presets. The filtered preset excludes
//! more build and cache directories because those rarely hold the files a
//! user is filtering for.

use std::collections::BTreeSet;
use std::path::Path;

/// Default recursion limit, counted from the root directory (depth 0)
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// Directories skipped when measuring a whole folder
const FULL_SIZE_EXCLUDED: &[&str] = &["node_modules", ".git", "dist", "build", ".next"];

/// Extra directories skipped when measuring by file type
const BY_TYPE_EXCLUDED: &[&str] = &[
    "target",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    "coverage",
    "out",
    "bin",
    "obj",
    ".cache",
    ".gradle",
];

/// Editor configuration directories, skipped under every preset
const EDITOR_CONFIG_DIRS: &[&str] = &[".vscode", ".idea"];

/// Version-control directory, never skipped just for being hidden
const VCS_DIR: &str = ".git";

fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Name-based skip rules applied to every entry during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    /// Directory names whose whole subtree is left out
    pub excluded_dirs: BTreeSet<String>,
    /// Entry names that are always left out
    pub always_skipped: BTreeSet<String>,
    /// Leave out entries whose name starts with `.`
    pub skip_hidden: bool,
    /// Hidden names that the hidden rule lets through
    pub hidden_exemptions: BTreeSet<String>,
}

impl SkipPolicy {
    /// Looser preset for whole-folder size
    pub fn full_size() -> Self {
        Self {
            excluded_dirs: name_set(FULL_SIZE_EXCLUDED),
            always_skipped: name_set(EDITOR_CONFIG_DIRS),
            skip_hidden: true,
            hidden_exemptions: name_set(&[VCS_DIR]),
        }
    }

    /// Stricter preset for measurement filtered by file type
    pub fn by_type() -> Self {
        let mut policy = Self::full_size();
        policy
            .excluded_dirs
            .extend(BY_TYPE_EXCLUDED.iter().map(|n| n.to_string()));
        policy
    }

    /// Add more excluded directory names
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs.extend(
            names
                .into_iter()
                .map(Into::into)
                .filter(|n: &String| !n.is_empty()),
        );
        self
    }

    fn passes_name_rules(&self, name: &str) -> bool {
        if self.always_skipped.contains(name) {
            return false;
        }
        if self.skip_hidden && name.starts_with('.') && !self.hidden_exemptions.contains(name) {
            return false;
        }
        true
    }

    /// Whether the walk should descend into a directory with this name
    pub fn admits_dir(&self, name: &str) -> bool {
        !self.excluded_dirs.contains(name) && self.passes_name_rules(name)
    }

    /// Whether a file with this name may be counted
    pub fn admits_file(&self, name: &str) -> bool {
        self.passes_name_rules(name)
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::full_size()
    }
}

/// Options for one folder-size scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Lowercase extensions without the dot; empty counts every file
    pub extensions: BTreeSet<String>,
    pub max_depth: usize,
    pub policy: SkipPolicy,
}

impl ScanOptions {
    /// Count every file, using the whole-folder preset
    pub fn full() -> Self {
        Self {
            extensions: BTreeSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            policy: SkipPolicy::full_size(),
        }
    }

    /// Count only files with the given extensions
    ///
    /// Accepts `"txt"`, `".txt"` or `".TXT"`. An empty list behaves like
    /// [`ScanOptions::full`] with the stricter by-type preset.
    pub fn by_type<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .filter_map(|e| normalize_extension(e.as_ref()))
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            policy: SkipPolicy::by_type(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether a file's extension passes the filter
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::full()
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.').to_lowercase();
    (!ext.is_empty()).then_some(ext)
}
