//! Turning an image-group container into slideshow markup.
//!
//! ```text
//! div.branch-image                      (container, kept)
//! └── div.bnuts-gallery [tabindex=0]    (region)
//!     ├── div.bnuts-slides-wrapper      (track, translated by show())
//!     │   ├── div.bnuts-slide
//!     │   │   ├── img.bnuts-img [loading=lazy]
//!     │   │   └── div.bnuts-caption     (only when alt has text)
//!     │   └── ...
//!     ├── div.bnuts-controls            ─┐
//!     │   ├── button "Previous image"    │ multi-slide only
//!     │   └── button "Next image"        │
//!     └── div.bnuts-dots                 │
//!         └── button.bnuts-dot × N      ─┘
//! ```

use super::{Controls, GalleryId, GalleryInstance, Slide};
use crate::config::GalleryConfig;
use crate::dom::{Document, NodeId};
use crate::event_loop::Scheduler;

pub const REGION_CLASS: &str = "bnuts-gallery";
pub const TRACK_CLASS: &str = "bnuts-slides-wrapper";
pub const SLIDE_CLASS: &str = "bnuts-slide";
pub const IMAGE_CLASS: &str = "bnuts-img";
pub const CAPTION_CLASS: &str = "bnuts-caption";
pub const CONTROLS_CLASS: &str = "bnuts-controls";
pub const DOTS_CLASS: &str = "bnuts-dots";
pub const DOT_CLASS: &str = "bnuts-dot";

const PREVIOUS_GLYPH: &str = "\u{276E}";
const NEXT_GLYPH: &str = "\u{276F}";

/// Attached containers carrying `class`, in document order.
pub fn find_containers(doc: &Document, class: &str) -> Vec<NodeId> {
    doc.elements_by_class(doc.root(), class)
}

/// Whether `container` already holds a generated gallery region.
pub fn is_enhanced(doc: &Document, container: NodeId) -> bool {
    doc.child_elements(container)
        .into_iter()
        .any(|c| doc.has_class(c, REGION_CLASS))
}

/// Replace the container's contents with a slideshow of its images.
///
/// Returns `None`, leaving the container untouched, when it holds no images
/// or has already been enhanced. Multi-slide galleries start autoplay on
/// `scheduler` before returning.
pub fn enhance<S: Scheduler>(
    doc: &mut Document,
    container: NodeId,
    id: GalleryId,
    config: &GalleryConfig,
    scheduler: &mut S,
) -> Option<GalleryInstance> {
    if is_enhanced(doc, container) {
        return None;
    }
    let images = doc.elements_by_tag(container, "img");
    if images.is_empty() {
        return None;
    }

    let region = element_with_class(doc, "div", REGION_CLASS);
    let track = element_with_class(doc, "div", TRACK_CLASS);

    let slides: Vec<Slide> = images
        .into_iter()
        .map(|image| build_slide(doc, image, track))
        .collect();

    doc.clear_children(container);
    doc.append_child(region, track);

    let controls = (slides.len() > 1).then(|| build_controls(doc, region, slides.len()));
    if controls.is_some() {
        doc.set_attr(region, "tabindex", "0");
        doc.set_attr(
            region,
            "data-autoplay-interval",
            &config.autoplay_interval_ms.to_string(),
        );
    }
    doc.append_child(container, region);

    let mut gallery = GalleryInstance::new(
        id,
        region,
        track,
        slides,
        controls,
        config.autoplay_interval(),
    );
    gallery.show(doc, 0);
    gallery.start_autoplay(scheduler);
    Some(gallery)
}

fn element_with_class(doc: &mut Document, tag: &str, class: &str) -> NodeId {
    let el = doc.create_element(tag);
    doc.set_attr(el, "class", class);
    el
}

/// Move one image into a fresh slide appended to `track`.
fn build_slide(doc: &mut Document, image: NodeId, track: NodeId) -> Slide {
    let declared = doc.attr(image, "loading").filter(|v| !v.is_empty());
    if declared.is_none() {
        doc.set_attr(image, "loading", "lazy");
    }
    doc.add_class(image, IMAGE_CLASS);

    let wrapper = element_with_class(doc, "div", SLIDE_CLASS);
    let alt = doc.attr(image, "alt").unwrap_or_default().to_string();
    doc.append_child(wrapper, image);

    let caption = (!alt.trim().is_empty()).then(|| {
        let overlay = element_with_class(doc, "div", CAPTION_CLASS);
        doc.set_text(overlay, &alt);
        doc.append_child(wrapper, overlay);
        alt
    });
    doc.append_child(track, wrapper);

    Slide {
        image,
        wrapper,
        caption,
    }
}

fn button(doc: &mut Document, class: Option<&str>, label: &str) -> NodeId {
    let button = doc.create_element("button");
    if let Some(class) = class {
        doc.set_attr(button, "class", class);
    }
    doc.set_attr(button, "type", "button");
    doc.set_attr(button, "aria-label", label);
    button
}

fn build_controls(doc: &mut Document, region: NodeId, count: usize) -> Controls {
    let bar = element_with_class(doc, "div", CONTROLS_CLASS);
    let previous = button(doc, None, "Previous image");
    doc.set_text(previous, PREVIOUS_GLYPH);
    let next = button(doc, None, "Next image");
    doc.set_text(next, NEXT_GLYPH);
    doc.append_child(bar, previous);
    doc.append_child(bar, next);
    doc.append_child(region, bar);

    let strip = element_with_class(doc, "div", DOTS_CLASS);
    let dots = (0..count)
        .map(|i| {
            let dot = button(doc, Some(DOT_CLASS), &format!("Go to slide {}", i + 1));
            doc.append_child(strip, dot);
            dot
        })
        .collect();
    doc.append_child(region, strip);

    Controls {
        previous,
        next,
        dots,
    }
}
