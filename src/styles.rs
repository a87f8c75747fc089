//! Gallery stylesheet and its one-time injection.
//!
//! The stylesheet is generated from [`GalleryConfig`] and added to the page's
//! `<head>` as a single `<style data-generated="bnuts-campus-gallery">`
//! block. Injection checks for that marker first, so booting a page twice
//! (or enhancing an already-enhanced page) never duplicates the block.

use crate::config::GalleryConfig;
use crate::dom::{Document, NodeId};

pub const STYLE_MARKER_ATTR: &str = "data-generated";
pub const STYLE_MARKER: &str = "bnuts-campus-gallery";

/// Generate the gallery CSS.
pub fn generate_gallery_css(config: &GalleryConfig) -> String {
    format!(
        r#"
.bnuts-gallery{{position:relative; overflow:hidden; width:100%; height:100%;}}
.bnuts-slides-wrapper{{display:flex; width:100%; height:100%; transition:transform {transition_s}s ease; will-change:transform}}
.bnuts-slide{{min-width:100%; height:100%; position:relative; display:block; flex:0 0 100%;}}
.bnuts-slide img{{display:block; width:100%; height:100%; object-fit:cover; vertical-align:middle}}
.bnuts-caption{{position:absolute; left:12px; right:12px; bottom:10px; background:{caption_bg}; color:#fff; padding:6px 10px; border-radius:6px; font-size:0.85rem; max-width:calc(100% - 24px);}}
.bnuts-controls{{position:absolute; top:50%; transform:translateY(-50%); width:100%; display:flex; justify-content:space-between; pointer-events:none}}
.bnuts-controls button{{pointer-events:auto; background:{caption_bg}; color:#fff; border:0; padding:8px 10px; border-radius:6px; margin:0 8px; cursor:pointer}}
.bnuts-dots{{position:absolute; left:50%; transform:translateX(-50%); bottom:8px; display:flex; gap:6px}}
.bnuts-dot{{width:9px; height:9px; border-radius:50%; background:rgba(255,255,255,0.6); border:0; cursor:pointer}}
.bnuts-dot.active{{background:{active_dot}}}
"#,
        transition_s = config.transition_ms as f64 / 1000.0,
        caption_bg = config.caption_background,
        active_dot = config.active_dot_color,
    )
}

/// The generated style block, if the page already has one.
pub fn find_injected(doc: &Document) -> Option<NodeId> {
    doc.elements_by_attr(doc.root(), STYLE_MARKER_ATTR, STYLE_MARKER)
        .into_iter()
        .find(|&n| doc.tag(n) == Some("style"))
}

/// Append the gallery style block to `<head>` unless one is already present.
///
/// Pages without a `<head>` get the block at the top of the document. Returns
/// whether a block was added.
pub fn inject_once(doc: &mut Document, css: &str) -> bool {
    if find_injected(doc).is_some() {
        return false;
    }
    let style = doc.create_element("style");
    doc.set_attr(style, STYLE_MARKER_ATTR, STYLE_MARKER);
    doc.set_raw_text(style, css);
    match doc.head() {
        Some(head) => doc.append_child(head, style),
        None => {
            let root = doc.root();
            doc.append_child(root, style);
        }
    }
    true
}
