//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output describes what was found on a page, not how the markup looks.
//! Galleries are listed by position with their slide counts; file paths and
//! state details follow as indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Galleries
//! 001 3 slides (2 captions)
//!     Autoplay: running
//! 002 1 slide (static)
//!
//! Site
//!     Styles: injected
//!     Mobile menu: found
//!     Cookie notice: not found
//! ```
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 index.html (2 galleries)
//! 002 campus/tour.htm (no galleries)
//! 003 broken.html
//!     Error: IO error: ...
//!
//! Assets
//!     img/hall.jpg
//!
//! Built 3 pages, 2 galleries, 1 asset (1 failed) → dist
//! ```
//!
//! ## Simulate
//!
//! ```text
//! 000 load @ 0ms
//!     Gallery 001: slide 1/3, running
//!     Menu: closed
//! 001 next @ 0ms
//!     Gallery 001: slide 2/3, running
//!     Menu: closed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::build::BuildReport;
use crate::gallery::AutoplayState;
use crate::page::{GallerySummary, PageSummary};
use crate::session::TraceEntry;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn gallery_count(n: usize) -> String {
    if n == 1 {
        "1 gallery".to_string()
    } else {
        format!("{n} galleries")
    }
}

fn autoplay_label(state: Option<AutoplayState>) -> &'static str {
    match state {
        Some(AutoplayState::Running) => "running",
        Some(AutoplayState::Paused) => "paused",
        None => "static",
    }
}

/// Gallery header: index, slide count and captions.
///
/// ```text
/// 001 3 slides (2 captions)
/// 002 1 slide (static)
/// ```
fn gallery_header(index: usize, gallery: &GallerySummary) -> String {
    let detail = if gallery.autoplay.is_none() {
        " (static)".to_string()
    } else if gallery.captions > 0 {
        format!(" ({})", plural(gallery.captions, "caption"))
    } else {
        String::new()
    };
    format!(
        "{} {}{}",
        format_index(index),
        plural(gallery.slides, "slide"),
        detail
    )
}

fn found(present: bool) -> &'static str {
    if present { "found" } else { "not found" }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(summary: &PageSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if summary.galleries.is_empty() {
        lines.push("No galleries".to_string());
    } else {
        lines.push("Galleries".to_string());
        for (i, gallery) in summary.galleries.iter().enumerate() {
            lines.push(gallery_header(i + 1, gallery));
            if gallery.autoplay.is_some() {
                lines.push(format!(
                    "{}Autoplay: {}",
                    indent(1),
                    autoplay_label(gallery.autoplay)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("Site".to_string());
    lines.push(format!(
        "{}Styles: {}",
        indent(1),
        if summary.styles_injected {
            "injected"
        } else {
            "already present"
        }
    ));
    lines.push(format!("{}Mobile menu: {}", indent(1), found(summary.mobile_menu)));
    lines.push(format!(
        "{}Cookie notice: {}",
        indent(1),
        found(summary.cookie_notice)
    ));
    lines
}

pub fn print_check_output(summary: &PageSummary) {
    for line in format_check_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_report(report: &BuildReport, output: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in report.pages.iter().enumerate() {
            match &page.result {
                Ok(summary) => {
                    let galleries = match summary.galleries.len() {
                        0 => "no galleries".to_string(),
                        n => gallery_count(n),
                    };
                    lines.push(format!(
                        "{} {} ({})",
                        format_index(i + 1),
                        page.path.display(),
                        galleries
                    ));
                }
                Err(e) => {
                    lines.push(format!("{} {}", format_index(i + 1), page.path.display()));
                    lines.push(format!("{}Error: {}", indent(1), e));
                }
            }
        }
    }

    if !report.copied.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Assets".to_string());
        for path in &report.copied {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let failures = report.failures();
    let failed = if failures > 0 {
        format!(" ({} failed)", failures)
    } else {
        String::new()
    };
    lines.push(format!(
        "Built {}, {}, {}{} → {}",
        plural(report.pages.len(), "page"),
        gallery_count(report.gallery_count()),
        plural(report.copied.len(), "asset"),
        failed,
        output.display()
    ));
    lines
}

pub fn print_build_report(report: &BuildReport, output: &Path) {
    for line in format_build_report(report, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Simulate
// ============================================================================

pub fn format_trace(trace: &[TraceEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in trace.iter().enumerate() {
        lines.push(format!("{} {} @ {}ms", format_index(i), entry.step, entry.at_ms));
        for (g, gallery) in entry.galleries.iter().enumerate() {
            lines.push(format!(
                "{}Gallery {}: slide {}/{}, {}",
                indent(1),
                format_index(g + 1),
                gallery.current + 1,
                gallery.slides,
                autoplay_label(gallery.autoplay)
            ));
        }
        if let Some(open) = entry.menu_open {
            lines.push(format!(
                "{}Menu: {}",
                indent(1),
                if open { "open" } else { "closed" }
            ));
        }
        if let Some(visible) = entry.cookie_notice_visible {
            lines.push(format!(
                "{}Cookie notice: {}",
                indent(1),
                if visible { "visible" } else { "hidden" }
            ));
        }
        if let Some(scroll) = &entry.scroll {
            lines.push(format!("{}Scroll: {}", indent(1), scroll));
        }
    }
    lines
}

pub fn print_trace(trace: &[TraceEntry]) {
    for line in format_trace(trace) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
