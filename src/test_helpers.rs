//! Shared test utilities for the slide-gal test suite.
//!
//! Page builders produce small, predictable documents; lookup helpers panic
//! with a clear message when the thing a test expects is missing.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let page = Page::load(&gallery_page(3), SiteConfig::default()).unwrap();
//! let track = page.gallery(0).unwrap().track();
//! assert_eq!(translate_percent(page.document(), track), 0);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::dom::{Document, NodeId};

// =========================================================================
// Fixture setup
// =========================================================================

/// A scratch copy of `fixtures/site/` that tests may build into or edit.
pub fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&fixtures).min_depth(1) {
        let entry = entry.unwrap();
        let dest = tmp.path().join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

// =========================================================================
// Page builders
// =========================================================================

/// A page with one `branch-image` container holding `photo-1.jpg` to
/// `photo-{n}.jpg`, each with alt text `Photo {i}`.
pub fn gallery_page(n: usize) -> String {
    let images: String = (1..=n)
        .map(|i| format!("<img src=\"photo-{i}.jpg\" alt=\"Photo {i}\">"))
        .collect();
    format!(
        "<!DOCTYPE html><html><head><title>Campus</title></head><body>\
         <div class=\"branch-image\">{images}</div>\
         </body></html>"
    )
}

/// A page with the mobile menu, a scroll target, the cookie notice and one
/// three-image gallery.
pub fn full_page() -> String {
    "<!DOCTYPE html><html><head><title>Campus</title></head><body>\
     <header>\
     <button id=\"mobileMenuToggle\" aria-expanded=\"false\">Menu</button>\
     <nav id=\"mainNav\">\
     <a href=\"#campus\">Campus</a>\
     <a href=\"/admissions.html\">Admissions</a>\
     </nav>\
     </header>\
     <section id=\"campus\">\
     <div class=\"branch-image\">\
     <img src=\"hall.jpg\" alt=\"Main hall\">\
     <img src=\"library.jpg\" alt=\"Library\">\
     <img src=\"lab.jpg\">\
     </div>\
     </section>\
     <div id=\"cookie-notice\" style=\"display: none;\">\
     <p>We use cookies.</p>\
     <button id=\"cookie-accept\">Accept</button>\
     </div>\
     </body></html>"
        .to_string()
}

// =========================================================================
// Lookups
// =========================================================================

/// The percentage in the element's `translateX(...)` transform.
/// Panics if the element has no such transform.
pub fn translate_percent(doc: &Document, node: NodeId) -> i64 {
    let transform = doc
        .style_property(node, "transform")
        .unwrap_or_else(|| panic!("node {node:?} has no transform"));
    transform
        .strip_prefix("translateX(")
        .and_then(|rest| rest.strip_suffix("%)"))
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("unexpected transform '{transform}'"))
}
