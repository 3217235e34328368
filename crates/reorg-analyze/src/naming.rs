//! Name normalization.
//!
//! A normalized name is the lowercase, underscore-separated form of a name
//! with its extension kept (and lower-cased). Technical names such as
//! dotfiles, OS metadata and temp files are never touched.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};

use reorg_core::{EntryKind, NormalizeSettings, WalkEntry};

/// Glob patterns for names that are OS or tool metadata.
pub const DEFAULT_TECHNICAL_PATTERNS: &[&str] =
    &[".*", "~*", "*.DS_Store", "*Thumbs.db", "*.tmp"];

/// Build a glob set from patterns, skipping (and logging) invalid ones.
pub(crate) fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern.as_ref()) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Ignoring invalid pattern '{}': {e}", pattern.as_ref()),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Cannot build pattern set: {e}");
        GlobSet::empty()
    })
}

/// Split a name into stem and extension.
///
/// The extension starts at the last dot and includes it. Names starting
/// with a dot have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    if name.starts_with('.') {
        return (name, "");
    }
    match name.rfind('.') {
        Some(i) => (&name[..i], &name[i..]),
        None => (name, ""),
    }
}

/// Normalize a stem: break camelCase, collapse runs of non-alphanumerics into
/// one `_`, trim `_` at both ends, lower-case.
pub fn normalize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;
    let mut separator = false;

    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                separator = true;
            }
            if separator && !out.is_empty() {
                out.push('_');
            }
            separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            separator = true;
        }
        prev = Some(c);
    }

    out
}

/// Normalize a full file or folder name.
///
/// When nothing alphanumeric is left of the stem the name is returned
/// unchanged, so normalization is idempotent.
pub fn normalize_name(name: &str) -> String {
    let (stem, extension) = split_extension(name);
    let stem = normalize_stem(stem);
    if stem.is_empty() {
        return name.to_string();
    }
    format!("{stem}{}", extension.to_lowercase())
}

/// Matcher for technical names.
#[derive(Debug, Clone)]
pub struct TechnicalNames {
    set: GlobSet,
}

impl TechnicalNames {
    /// Build a matcher from glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            set: build_glob_set(patterns),
        }
    }

    /// Check whether a single name is technical.
    pub fn is_technical(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

impl Default for TechnicalNames {
    fn default() -> Self {
        Self::new(DEFAULT_TECHNICAL_PATTERNS)
    }
}

/// Check a name against the default technical patterns.
pub fn is_technical(name: &str) -> bool {
    TechnicalNames::default().is_technical(name)
}

/// Configuration for the name normalizer.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct NormalizeConfig {
    /// Extensions (lowercase, with dot) of files renamed without asking.
    #[builder(default = "NormalizeSettings::default().auto_approve_extensions")]
    pub auto_approve_extensions: Vec<String>,

    /// Folder names excluded from renaming, along with their contents.
    #[builder(default)]
    pub excluded_folders: Vec<String>,

    /// Glob patterns of technical names.
    #[builder(default = "default_technical_patterns()")]
    pub technical_patterns: Vec<String>,

    /// Ask before renaming. When false every rename is applied.
    #[builder(default = "true")]
    pub prompt: bool,

    /// Compute candidates without renaming anything.
    #[builder(default = "false")]
    pub dry_run: bool,
}

fn default_technical_patterns() -> Vec<String> {
    DEFAULT_TECHNICAL_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::from(&NormalizeSettings::default())
    }
}

impl From<&NormalizeSettings> for NormalizeConfig {
    fn from(settings: &NormalizeSettings) -> Self {
        Self {
            auto_approve_extensions: settings
                .auto_approve_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            excluded_folders: settings.excluded_folders.clone(),
            technical_patterns: default_technical_patterns(),
            prompt: true,
            dry_run: false,
        }
    }
}

impl NormalizeConfig {
    /// Create a new config builder.
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder::default()
    }
}

/// A proposed rename for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameCandidate {
    /// Current absolute path.
    pub path: PathBuf,
    /// Current path relative to the walked root.
    pub relative: PathBuf,
    /// Current name.
    pub original: String,
    /// Normalized name.
    pub proposed: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Rename without prompting.
    pub auto_approve: bool,
}

impl RenameCandidate {
    /// Path after the rename.
    pub fn target(&self) -> PathBuf {
        self.path.with_file_name(&self.proposed)
    }
}

/// Decides which entries get renamed and whether to ask first.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    config: NormalizeConfig,
    technical: TechnicalNames,
}

impl NamePolicy {
    /// Create a policy from config.
    pub fn new(config: NormalizeConfig) -> Self {
        let technical = TechnicalNames::new(&config.technical_patterns);
        Self { config, technical }
    }

    /// The policy's configuration.
    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Whether an entry is left alone regardless of its name.
    ///
    /// Technical names, anything below a hidden directory, and excluded
    /// folders with their contents are skipped.
    pub fn is_excluded(&self, entry: &WalkEntry) -> bool {
        if self.technical.is_technical(&entry.name) {
            return true;
        }
        let under_hidden = entry
            .relative
            .parent()
            .is_some_and(|p| p.components().any(|c| c.as_os_str().to_string_lossy().starts_with('.')));
        under_hidden || entry.is_within_any(&self.config.excluded_folders)
    }

    /// Whether a rename of this entry needs no confirmation.
    pub fn is_auto_approved(&self, name: &str, kind: EntryKind) -> bool {
        if !self.config.prompt {
            return true;
        }
        if kind == EntryKind::Directory {
            return false;
        }
        let (_, extension) = split_extension(name);
        let extension = extension.to_lowercase();
        !extension.is_empty() && self.config.auto_approve_extensions.contains(&extension)
    }

    /// The rename for an entry, or `None` when it is excluded or already
    /// normalized.
    pub fn candidate(&self, entry: &WalkEntry) -> Option<RenameCandidate> {
        if self.is_excluded(entry) {
            return None;
        }
        let proposed = normalize_name(&entry.name);
        if proposed == entry.name {
            return None;
        }
        Some(RenameCandidate {
            path: entry.path.clone(),
            relative: entry.relative.clone(),
            original: entry.name.clone(),
            auto_approve: self.is_auto_approved(&entry.name, entry.kind),
            proposed,
            kind: entry.kind,
        })
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(NormalizeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn entry(relative: &str, kind: EntryKind) -> WalkEntry {
        let relative = PathBuf::from(relative);
        WalkEntry {
            path: Path::new("/docs").join(&relative),
            name: relative.file_name().unwrap().to_string_lossy().to_string(),
            depth: relative.components().count(),
            relative,
            kind,
            stat: None,
        }
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.pdf"), ("report", ".pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("file."), ("file", "."));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("My Report.PDF"), "my_report.pdf");
        assert_eq!(normalize_name("camelCaseName.txt"), "camel_case_name.txt");
        assert_eq!(normalize_name("version2Final.doc"), "version2_final.doc");
        assert_eq!(normalize_name("ABCDef"), "abcdef");
        assert_eq!(normalize_name("  --Weird__ name!! "), "weird_name");
        assert_eq!(normalize_name("archive.tar.GZ"), "archive_tar.gz");
        assert_eq!(normalize_name("Café Menu.txt"), "caf_menu.txt");
        assert_eq!(normalize_name("already_fine.md"), "already_fine.md");
        assert_eq!(normalize_name("Project Notes"), "project_notes");
    }

    #[test]
    fn test_empty_stem_is_left_alone() {
        assert_eq!(normalize_name("---.txt"), "---.txt");
        assert_eq!(normalize_name("!!!"), "!!!");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "My Report.PDF",
            "camelCaseName.txt",
            "a..",
            "file.",
            "x.T x",
            "---.txt",
            "ÜberFile.JPG",
            "2024-01-05 Scan (1).Jpeg",
            "already_fine",
            "a_B-c D.E.F",
            ".Hidden",
        ];
        for sample in samples {
            let once = normalize_name(sample);
            assert_eq!(normalize_name(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_extension_always_lowercased() {
        for name in ["Photo.JPG", "photo.Jpg", "PHOTO.jPg"] {
            assert!(normalize_name(name).ends_with(".jpg"));
        }
    }

    #[test]
    fn test_technical_names() {
        assert!(is_technical(".DS_Store"));
        assert!(is_technical(".git"));
        assert!(is_technical("~$report.docx"));
        assert!(is_technical("Thumbs.db"));
        assert!(is_technical("download.tmp"));
        assert!(!is_technical("Report.pdf"));
        assert!(!is_technical("temp"));
    }

    #[test]
    fn test_policy_excludes_hidden_ancestors_and_vaults() {
        let config = NormalizeConfig::builder()
            .excluded_folders(vec!["Obsidian Vault".to_string()])
            .build()
            .unwrap();
        let policy = NamePolicy::new(config);

        assert!(policy.is_excluded(&entry(".config/Some File.txt", EntryKind::File)));
        assert!(policy.is_excluded(&entry("Obsidian Vault", EntryKind::Directory)));
        assert!(policy.is_excluded(&entry("Obsidian Vault/Daily Note.md", EntryKind::File)));
        assert!(!policy.is_excluded(&entry("Work/Some File.txt", EntryKind::File)));
    }

    #[test]
    fn test_auto_approval() {
        let policy = NamePolicy::default();
        assert!(policy.is_auto_approved("Photo.JPG", EntryKind::File));
        assert!(!policy.is_auto_approved("Script.sh", EntryKind::File));
        assert!(!policy.is_auto_approved("Notes.md", EntryKind::Directory));

        let no_prompt = NamePolicy::new(NormalizeConfig::builder().prompt(false).build().unwrap());
        assert!(no_prompt.is_auto_approved("Script.sh", EntryKind::File));
        assert!(no_prompt.is_auto_approved("Some Folder", EntryKind::Directory));
    }

    #[test]
    fn test_candidate() {
        let policy = NamePolicy::default();

        let candidate = policy.candidate(&entry("Work/Tax Return.PDF", EntryKind::File)).unwrap();
        assert_eq!(candidate.proposed, "tax_return.pdf");
        assert_eq!(candidate.target(), PathBuf::from("/docs/Work/tax_return.pdf"));
        assert!(candidate.auto_approve);

        assert!(policy.candidate(&entry("Work/done.txt", EntryKind::File)).is_none());
        assert!(policy.candidate(&entry("Work/.DS_Store", EntryKind::File)).is_none());
    }
}
