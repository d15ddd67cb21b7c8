//! Shared, atomically replaceable library handle.

use crate::library::TemplateLibrary;
use crate::util::EquipMatchResult;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// A library shared between detection calls.
///
/// Readers take an `Arc` snapshot and keep using it for the whole call. A
/// reload builds the new library completely before swapping the pointer, so
/// no reader ever sees a partially loaded library.
#[derive(Debug)]
pub struct SharedLibrary {
    dir: Option<PathBuf>,
    current: RwLock<Arc<TemplateLibrary>>,
}

impl SharedLibrary {
    /// Wraps an in-memory library. [`SharedLibrary::reload`] keeps it as is.
    pub fn new(library: TemplateLibrary) -> Self {
        Self {
            dir: None,
            current: RwLock::new(Arc::new(library)),
        }
    }

    /// Loads `dir` and remembers it for later reloads.
    pub fn open<P: AsRef<Path>>(dir: P) -> EquipMatchResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let library = TemplateLibrary::load(&dir)?;
        Ok(Self {
            dir: Some(dir),
            current: RwLock::new(Arc::new(library)),
        })
    }

    /// Directory the library is reloaded from, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Current library.
    pub fn snapshot(&self) -> Arc<TemplateLibrary> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in a new library and returns the previous one.
    pub fn replace(&self, library: TemplateLibrary) -> Arc<TemplateLibrary> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(library))
    }

    /// Re-scans the directory and swaps the result in.
    ///
    /// On error the current library stays in place.
    pub fn reload(&self) -> EquipMatchResult<Arc<TemplateLibrary>> {
        if let Some(dir) = &self.dir {
            let library = TemplateLibrary::load(dir)?;
            self.replace(library);
        }
        Ok(self.snapshot())
    }
}
