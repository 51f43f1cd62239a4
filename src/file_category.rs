/// Extension-based file categorization.
///
/// A [`CategoryRuleTable`] is an ordered list of named categories, each owning a
/// set of lowercase extensions such as `.jpg`. Classification walks the table in
/// order and returns the first category whose set contains the file's extension.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{CategoryRuleTable, classify};
///
/// let table = CategoryRuleTable::default();
/// assert_eq!(classify("holiday.JPG", &table), Some("Images"));
/// assert_eq!(classify("notes.txt", &table), Some("Documents"));
/// assert_eq!(classify("Makefile", &table), None);
/// ```
use crate::error::{SortError, SortResult};
use std::path::Path;

/// The built-in categories, in table order.
const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "Images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"],
    ),
    (
        "Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
        ],
    ),
    ("Audio", &[".mp3", ".wav", ".ogg", ".flac", ".aac"]),
    ("Video", &[".mp4", ".avi", ".mkv", ".mov", ".wmv"]),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    ("Executables", &[".exe", ".msi", ".dmg", ".pkg", ".deb"]),
    (
        "Code",
        &[
            ".py", ".js", ".html", ".css", ".cpp", ".java", ".php", ".json", ".xml",
        ],
    ),
];

/// A named category and the extensions that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    extensions: Vec<String>,
}

impl CategoryRule {
    /// The category name, also used as the destination subdirectory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized extensions (lowercase, leading `.`), in insertion order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns true if `ext` (already lowercase, with leading `.`) is in this rule.
    pub fn matches(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Ordered mapping from category name to extension set.
///
/// The table is a value: [`with_rule`](Self::with_rule) and
/// [`retain_categories`](Self::retain_categories) return a new table and leave
/// the receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRuleTable {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleTable {
    /// Creates an empty table. Use [`Default`] for the built-in categories.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates the built-in table (Images, Documents, Audio, Video, Archives,
    /// Executables, Code).
    pub fn builtin() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(name, exts)| CategoryRule {
                name: (*name).to_string(),
                extensions: exts.iter().map(|e| (*e).to_string()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Returns a table with `name` mapped to `extensions`.
    ///
    /// An existing category with the same name keeps its position and has its
    /// extension set replaced. Extensions are trimmed, lower-cased and given a
    /// leading `.` when it is missing; blanks and repeats are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::InvalidRule`] if the name is blank or no usable
    /// extension remains.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::CategoryRuleTable;
    ///
    /// let table = CategoryRuleTable::default()
    ///     .with_rule("Ebooks", &["EPUB", ".mobi"])
    ///     .unwrap();
    /// assert_eq!(table.classify("book.epub"), Some("Ebooks"));
    /// ```
    pub fn with_rule<S: AsRef<str>>(&self, name: &str, extensions: &[S]) -> SortResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SortError::InvalidRule {
                name: name.to_string(),
                reason: "category name is empty".to_string(),
            });
        }

        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            if let Some(ext) = normalize_extension(ext.as_ref())
                && !normalized.contains(&ext)
            {
                normalized.push(ext);
            }
        }
        if normalized.is_empty() {
            return Err(SortError::InvalidRule {
                name: name.to_string(),
                reason: "extension list is empty".to_string(),
            });
        }

        let mut table = self.clone();
        match table.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => rule.extensions = normalized,
            None => table.rules.push(CategoryRule {
                name: name.to_string(),
                extensions: normalized,
            }),
        }
        Ok(table)
    }

    /// Returns a table holding only the categories accepted by `keep`, in the
    /// same order.
    pub fn retain_categories<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|r| keep(&r.name))
                .cloned()
                .collect(),
        }
    }

    /// Classifies a file name. See [`classify`].
    pub fn classify(&self, filename: &str) -> Option<&str> {
        let ext = extension_of(filename)?;
        self.rules
            .iter()
            .find(|rule| rule.matches(&ext))
            .map(|rule| rule.name.as_str())
    }

    /// Looks up a category by name.
    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Category names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a CategoryRuleTable {
    type Item = &'a CategoryRule;
    type IntoIter = std::slice::Iter<'a, CategoryRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Maps a file name to the first matching category in `table`.
///
/// Matching is case-insensitive on the extension. Names without an extension
/// (including dotfiles such as `.bashrc`) never match.
pub fn classify<'t>(filename: &str, table: &'t CategoryRuleTable) -> Option<&'t str> {
    table.classify(filename)
}

/// Splits a comma-separated extension list such as `".jpg, .png"`.
pub fn parse_extension_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the lowercase extension of `filename` including the leading `.`.
fn extension_of(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_string_lossy();
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

impl Default for CategoryRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}
