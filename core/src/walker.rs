//! Project walking and extension-based language detection.
//!
//! Exclusion is by exact directory name only (`target`, `node_modules`, ...);
//! glob or path patterns are not supported.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories a checker never descends into, on top of the user's excludes.
const BUILD_DIRS: &[&str] = &["target", "node_modules", ".git", "build"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Solidity,
    Go,
    Cpp,
    Move,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Rust,
        Language::Solidity,
        Language::Go,
        Language::Cpp,
        Language::Move,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Solidity => &["sol"],
            Language::Go => &["go"],
            Language::Cpp => &["cpp", "cc", "cxx", "c", "h", "hpp"],
            Language::Move => &["move"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Language> {
        let ext = ext.to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension)
    }

    /// Parse a language tag as used in rule files and checker selections.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Language::Rust),
            "solidity" | "sol" => Some(Language::Solidity),
            "go" | "golang" => Some(Language::Go),
            "cpp" | "c++" | "c" => Some(Language::Cpp),
            "move" => Some(Language::Move),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Solidity => "solidity",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::Move => "move",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files of a project grouped by language, each list in traversal order.
#[derive(Debug, Default, Clone)]
pub struct ProjectInventory {
    pub files: BTreeMap<Language, Vec<PathBuf>>,
}

impl ProjectInventory {
    pub fn languages(&self) -> BTreeSet<Language> {
        self.files.keys().copied().collect()
    }

    pub fn files_for(&self, language: Language) -> &[PathBuf] {
        self.files.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectWalker {
    exclude: Vec<String>,
    skip_hidden: bool,
    skip_build_dirs: bool,
}

impl ProjectWalker {
    /// Walker used for language detection: honours only the exclude list.
    pub fn new(exclude: &[String]) -> Self {
        Self {
            exclude: exclude.to_vec(),
            skip_hidden: false,
            skip_build_dirs: false,
        }
    }

    /// Walker used by checkers: also skips hidden and build directories.
    pub fn for_checkers(exclude: &[String]) -> Self {
        Self {
            exclude: exclude.to_vec(),
            skip_hidden: true,
            skip_build_dirs: true,
        }
    }

    /// Walk `root` once. Unreadable entries are skipped; symlinks are not
    /// followed, so link cycles cannot trap the walk.
    pub fn walk(&self, root: &Path) -> ProjectInventory {
        let mut inventory = ProjectInventory::default();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_pruned(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(language) = Language::from_path(entry.path()) {
                inventory
                    .files
                    .entry(language)
                    .or_default()
                    .push(entry.into_path());
            }
        }
        inventory
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.exclude.iter().any(|ex| ex == name.as_ref()) {
            return true;
        }
        if self.skip_hidden && name.starts_with('.') {
            return true;
        }
        self.skip_build_dirs && BUILD_DIRS.contains(&name.as_ref())
    }
}

/// Languages present under `root`, derived from file extensions.
pub fn detect_languages(root: &Path, exclude: &[String]) -> BTreeSet<Language> {
    ProjectWalker::new(exclude).walk(root).languages()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// test\n").unwrap();
    }

    #[test]
    fn detects_languages_by_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "contracts/Token.sol");
        touch(dir.path(), "native/lib.hpp");
        touch(dir.path(), "README.md");

        let langs = detect_languages(dir.path(), &[]);
        assert_eq!(
            langs.into_iter().collect::<Vec<_>>(),
            vec![Language::Rust, Language::Solidity, Language::Cpp]
        );
    }

    #[test]
    fn excluded_directories_are_skipped_by_exact_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "vendor/dep.go");
        touch(dir.path(), "vendor2/dep.move");

        let langs = detect_languages(dir.path(), &["vendor".to_string()]);
        assert!(!langs.contains(&Language::Go));
        assert!(langs.contains(&Language::Move));
    }

    #[test]
    fn checker_walk_skips_hidden_and_build_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/lib.rs");
        touch(dir.path(), "target/debug/build.rs");
        touch(dir.path(), ".cache/gen.rs");

        let detection = ProjectWalker::new(&[]).walk(dir.path());
        assert_eq!(detection.files_for(Language::Rust).len(), 3);

        let checker_view = ProjectWalker::for_checkers(&[]).walk(dir.path());
        let files = checker_view.files_for(Language::Rust);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/lib.rs"));
    }

    #[test]
    fn traversal_order_is_stable() {
        let dir = TempDir::new().unwrap();
        for name in ["b.rs", "a.rs", "c/d.rs"] {
            touch(dir.path(), name);
        }
        let first = ProjectWalker::new(&[]).walk(dir.path());
        let second = ProjectWalker::new(&[]).walk(dir.path());
        assert_eq!(first.files_for(Language::Rust), second.files_for(Language::Rust));
        assert!(first.files_for(Language::Rust)[0].ends_with("a.rs"));
    }

    #[test]
    fn single_file_root_is_classified() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.go");
        let inventory = ProjectWalker::new(&[]).walk(&dir.path().join("one.go"));
        assert_eq!(inventory.file_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_do_not_trap_the_walk() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/lib.rs");
        touch(dir.path(), "b.go");
        std::os::unix::fs::symlink("..", dir.path().join("a/loop")).unwrap();

        let inventory = ProjectWalker::new(&[]).walk(dir.path());
        assert_eq!(inventory.file_count(), 2);
        assert_eq!(inventory.files_for(Language::Rust), &[dir.path().join("a/lib.rs")]);
        assert_eq!(inventory.files_for(Language::Go), &[dir.path().join("b.go")]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_does_not_hide_its_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "locked/hidden.sol");
        touch(dir.path(), "open/main.rs");
        touch(dir.path(), "z.move");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let enforced = fs::read_dir(&locked).is_err();

        let inventory = ProjectWalker::for_checkers(&[]).walk(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(inventory.files_for(Language::Rust).len(), 1);
        assert_eq!(inventory.files_for(Language::Move).len(), 1);
        if enforced {
            assert!(inventory.files_for(Language::Solidity).is_empty());
        }
    }
}
