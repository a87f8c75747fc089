//! Build-time enhancement of HTML pages.
//!
//! [`enhance_html`] boots one page and serializes the result: galleries
//! rendered into slideshow markup, the stylesheet injected once. [`build`]
//! does the same for a whole directory tree.
//!
//! ```text
//! site/                          dist/
//! ├── index.html     enhance ──▶ ├── index.html
//! ├── campus/                    ├── campus/
//! │   └── tour.htm   enhance ──▶ │   └── tour.htm
//! └── img/                       └── img/
//!     └── hall.jpg   copy    ──▶     └── hall.jpg
//! ```
//!
//! Pages are independent, so they are enhanced in parallel on the rayon
//! pool. A page that fails to parse is reported in its [`PageOutcome`] and
//! does not stop its siblings.

use crate::config::SiteConfig;
use crate::page::{Page, PageError, PageSummary};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Page(#[from] PageError),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Serialized page after boot, plus what the boot found.
#[derive(Debug, Clone)]
pub struct EnhancedPage {
    pub html: String,
    pub summary: PageSummary,
}

/// Boot `html` and serialize the enhanced document.
pub fn enhance_html(html: &str, config: &SiteConfig) -> Result<EnhancedPage, PageError> {
    let page = Page::load(html, config.clone())?;
    Ok(EnhancedPage {
        html: page.to_html(),
        summary: page.summary(),
    })
}

pub fn enhance_file(path: &Path, config: &SiteConfig) -> Result<EnhancedPage, BuildError> {
    let html = fs::read_to_string(path)?;
    Ok(enhance_html(&html, config)?)
}

/// Result for one page, keyed by its path relative to the source root.
#[derive(Debug)]
pub struct PageOutcome {
    pub path: PathBuf,
    pub result: Result<PageSummary, BuildError>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages in path order.
    pub pages: Vec<PageOutcome>,
    /// Non-page files copied verbatim, relative to the source root.
    pub copied: Vec<PathBuf>,
}

impl BuildReport {
    pub fn failures(&self) -> usize {
        self.pages.iter().filter(|p| p.result.is_err()).count()
    }

    pub fn gallery_count(&self) -> usize {
        self.pages
            .iter()
            .filter_map(|p| p.result.as_ref().ok())
            .map(|s| s.galleries.len())
            .sum()
    }
}

/// `.html` and `.htm` files, case-insensitively.
pub fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Enhance every page under `source` into `output`, copying everything else.
///
/// `output` may live inside `source`; its contents are never read back as
/// input.
pub fn build(source: &Path, output: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    if !source.is_dir() {
        return Err(BuildError::SourceNotFound(source.to_path_buf()));
    }
    fs::create_dir_all(output)?;

    let mut pages = Vec::new();
    let mut others = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().starts_with(output) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .unwrap_or(entry.path())
            .to_path_buf();
        if is_page(&rel) {
            pages.push(rel);
        } else {
            others.push(rel);
        }
    }
    info!(
        "building {}: {} pages, {} other files",
        source.display(),
        pages.len(),
        others.len()
    );

    for rel in &others {
        let dest = output.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source.join(rel), &dest)?;
        debug!("copied {}", rel.display());
    }

    let pages: Vec<PageOutcome> = pages
        .into_par_iter()
        .map(|rel| {
            let result = build_page(&source.join(&rel), &output.join(&rel), config);
            if let Err(e) = &result {
                warn!("{}: {}", rel.display(), e);
            }
            PageOutcome { path: rel, result }
        })
        .collect();

    Ok(BuildReport {
        pages,
        copied: others,
    })
}

fn build_page(input: &Path, dest: &Path, config: &SiteConfig) -> Result<PageSummary, BuildError> {
    let enhanced = enhance_file(input, config)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, enhanced.html)?;
    debug!(
        "enhanced {} ({} galleries)",
        input.display(),
        enhanced.summary.galleries.len()
    );
    Ok(enhanced.summary)
}
