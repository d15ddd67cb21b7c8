//! Template library: named reference images grouped by category.
//!
//! A library is built once (from a directory or from in-memory references)
//! and is read-only afterwards. Categories iterate in name order; templates
//! within a category keep their declaration order, which for directory loads
//! is sorted file-name order.

mod shared;

pub use shared::SharedLibrary;

use crate::image::io::load_gray_image;
use crate::template::ReferenceImage;
use crate::trace::{trace_event, trace_warn};
use crate::util::{EquipMatchError, EquipMatchResult};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// File extensions recognized as template images (compared case-insensitively).
pub const TEMPLATE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// What happened to the files seen while loading a directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of reference images added to the library.
    pub loaded: usize,
    /// Image files that could not be decoded.
    pub failed: Vec<PathBuf>,
    /// Template names seen more than once; only the first file was kept.
    pub duplicates: Vec<String>,
}

/// Mapping from category to its ordered reference images.
#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
    groups: BTreeMap<String, Vec<ReferenceImage>>,
}

impl TemplateLibrary {
    /// Library with no categories.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Groups in-memory references by category, keeping their order.
    ///
    /// A reference whose name was already seen is dropped.
    pub fn from_references(references: impl IntoIterator<Item = ReferenceImage>) -> Self {
        Self::group(references).0
    }

    fn group(references: impl IntoIterator<Item = ReferenceImage>) -> (Self, Vec<String>) {
        let mut groups: BTreeMap<String, Vec<ReferenceImage>> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for reference in references {
            let templates = groups.entry(reference.category().to_string()).or_default();
            if templates.iter().any(|t| t.name() == reference.name()) {
                trace_warn!("duplicate_template", template = reference.name());
                duplicates.push(reference.name().to_string());
                continue;
            }
            templates.push(reference);
        }
        (Self { groups }, duplicates)
    }

    /// Loads every recognized image file in `dir`.
    ///
    /// A missing directory yields an empty library. Files that fail to decode
    /// are skipped. Only an unreadable directory is an error.
    pub fn load<P: AsRef<Path>>(dir: P) -> EquipMatchResult<Self> {
        Self::load_with_report(dir).map(|(library, _)| library)
    }

    /// Like [`TemplateLibrary::load`], also reporting skipped files.
    pub fn load_with_report<P: AsRef<Path>>(dir: P) -> EquipMatchResult<(Self, LoadReport)> {
        let dir = dir.as_ref();
        let paths = match template_files(dir) {
            Ok(paths) => paths,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let shown = dir.display().to_string();
                trace_warn!("template_dir_missing", path = shown.as_str());
                return Ok((Self::empty(), LoadReport::default()));
            }
            Err(source) => {
                return Err(EquipMatchError::LibraryDirectory {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let mut report = LoadReport::default();
        let mut references = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                report.failed.push(path);
                continue;
            };
            match load_gray_image(&path) {
                Ok(image) => references.push(ReferenceImage::new(name, image)),
                Err(err) => {
                    let detail = err.to_string();
                    trace_warn!("template_decode_failed", reason = detail.as_str());
                    report.failed.push(path);
                }
            }
        }

        let (library, duplicates) = Self::group(references);
        report.loaded = library.num_templates();
        report.duplicates = duplicates;
        trace_event!(
            "library_loaded",
            categories = library.num_categories(),
            templates = report.loaded,
            failed = report.failed.len(),
        );
        Ok((library, report))
    }

    /// Returns `true` when there is nothing to match against.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn num_categories(&self) -> usize {
        self.groups.len()
    }

    pub fn num_templates(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Category names in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Templates of one category, in declaration order.
    pub fn templates(&self, category: &str) -> Option<&[ReferenceImage]> {
        self.groups.get(category).map(Vec::as_slice)
    }

    /// Looks up a template by name.
    pub fn template(&self, name: &str) -> Option<&ReferenceImage> {
        self.templates(crate::template::category_of(name))?
            .iter()
            .find(|t| t.name() == name)
    }

    /// Iterates `(category, templates)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ReferenceImage])> {
        self.groups
            .iter()
            .map(|(category, templates)| (category.as_str(), templates.as_slice()))
    }
}

/// Recognized image files directly inside `dir`, sorted by file name.
fn template_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_template_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TEMPLATE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
