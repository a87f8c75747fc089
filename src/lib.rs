//! # Slide Gal
//!
//! Turns groups of images in HTML pages into accessible slideshow galleries.
//! Any element carrying the container class (`branch-image` by default) that
//! holds images becomes a slideshow with captions, previous/next buttons, dot
//! indicators and autoplay that pauses while a visitor interacts with it.
//!
//! # Architecture: Boot, Then Events
//!
//! A page is a parsed document plus a virtual event loop. Booting it
//! (`Page::ready`) rewrites the markup once; after that everything is an
//! event delivered to an explicit state object:
//!
//! ```text
//! 1. Parse     html     →  Document        (arena DOM, lenient parser)
//! 2. Ready     Document →  GalleryInstance (markup rewritten, timers armed)
//! 3. Events    clicks, keys, focus, elapsed time → state transitions
//! 4. Emit      Document →  html            (enhanced page, or a trace)
//! ```
//!
//! Steps 1, 2 and 4 are the build-time enhancer (`enhance`, `build`). Step 3
//! is what `simulate` replays to show what a visitor would see.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | Arena document: parsing with quick-xml, queries, class/style edits, serialization |
//! | [`event_loop`] | Virtual clock and repeating intervals behind the [`event_loop::Scheduler`] trait |
//! | [`gallery`] | Container → slideshow markup and the per-gallery state machine |
//! | [`styles`] | Gallery stylesheet generation and one-time injection |
//! | [`site`] | Mobile menu, smooth scrolling, cookie notice and flag stores |
//! | [`page`] | A booted page routing events to galleries and site behaviors |
//! | [`session`] | Step scripts replayed against a page, producing traces |
//! | [`build`] | Page and directory enhancement, pages processed in parallel |
//! | [`scaffold`] | Starter pages rendered with Maud |
//! | [`config`] | `slide-gal.toml` loading, validation and stock defaults |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Explicit State Objects
//!
//! A gallery is a [`gallery::GalleryInstance`] holding its slides, current
//! index and timer handle. Event handlers are methods, so each transition can
//! be driven and asserted in a unit test without a browser.
//!
//! ## Virtual Time
//!
//! Autoplay runs on [`event_loop::EventLoop`], a deterministic clock that
//! only moves when told to. A restart always cancels the old interval before
//! arming a new one, so a gallery never holds two live timers.
//!
//! ## Idempotent Boot
//!
//! The stylesheet is marked with `data-generated="bnuts-campus-gallery"` and
//! enhanced containers are recognised by their region child. Booting twice,
//! or enhancing already-enhanced output, changes nothing.
//!
//! ## Silent Degradation
//!
//! Missing optional elements (no nav, no cookie notice, a container without
//! images) are skipped without a log line. An unavailable flag store or an
//! unsupported motion query turns the feature into a no-op.

pub mod build;
pub mod config;
pub mod dom;
pub mod event_loop;
pub mod gallery;
pub mod output;
pub mod page;
pub mod scaffold;
pub mod session;
pub mod site;
pub mod styles;

#[cfg(test)]
pub(crate) mod test_helpers;
