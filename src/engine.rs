//! Locating and binding the pdfium shared library.
//!
//! Only image output needs pdfium; PDF output runs on `lopdf` alone. The
//! library is looked up in this order:
//!
//! 1. an explicit path from [`crate::SplitConfig::pdfium_lib_path`]
//! 2. `PDFIUM_LIB_PATH`
//! 3. the platform library name in the working directory
//! 4. the system library search path
//!
//! A path may point at the library file itself or at the directory holding it.

use crate::error::SplitError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// The explicitly configured library location, if any.
///
/// An explicit path wins over `PDFIUM_LIB_PATH`; an empty variable counts as unset.
pub fn configured_library_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    std::env::var(PDFIUM_LIB_PATH_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Bind to pdfium, returning a ready-to-use handle.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, SplitError> {
    let bindings = match configured_library_path(explicit) {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
                .map_err(|e| SplitError::PdfiumBindingFailed(format!("{}: {e:?}", lib.display())))?
        }
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| SplitError::PdfiumBindingFailed(format!("{e:?}")))?,
    };

    Ok(Pdfium::new(bindings))
}
