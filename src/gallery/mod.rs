//! Slideshow galleries.
//!
//! Each image-group container on a page becomes one [`GalleryInstance`]: an
//! explicit state object holding the slides, the current index and the
//! autoplay timer handle. Pointer, keyboard, focus and timer events are
//! methods on the instance, so every transition can be driven and inspected
//! without a browser.
//!
//! ## Autoplay
//!
//! ```text
//!            pointer-enter / focus-in
//!   Running ─────────────────────────▶ Paused
//!      ▲   ◀─────────────────────────    │
//!      │     pointer-leave / focus-out   │
//!      └──── manual navigation ──────────┘
//!            (cancel + fresh timer)
//! ```
//!
//! A manual navigation always restarts the timer, so the next automatic
//! advance is a full interval after the last user action. Starting while
//! already running is a no-op: an instance never holds two live timers.
//!
//! Single-slide galleries are static: no controls, no dots, no timer, and
//! every interaction event is ignored.
//!
//! The markup side (turning a container into slides, controls and dots) lives
//! in [`markup`].

pub mod markup;

use crate::dom::{Document, NodeId};
use crate::event_loop::{Scheduler, TimerHandle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use markup::{enhance, find_containers, is_enhanced};

/// Position of a gallery on its page, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GalleryId(pub usize);

/// One image plus its optional caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub(crate) image: NodeId,
    pub(crate) wrapper: NodeId,
    pub(crate) caption: Option<String>,
}

impl Slide {
    /// The `img` element shown by this slide.
    pub fn image(&self) -> NodeId {
        self.image
    }

    /// The `div.bnuts-slide` wrapping the image.
    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoplayState {
    Running,
    Paused,
}

/// Keys the gallery listens for. Everything else is [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// User interaction with a gallery region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryEvent {
    /// Click on the "previous" control.
    Previous,
    /// Click on the "next" control.
    Next,
    /// Click on the dot for the given 0-based slide.
    Dot(usize),
    KeyDown(Key),
    PointerEnter,
    PointerLeave,
    FocusIn,
    FocusOut,
}

/// Navigation buttons, present only on multi-slide galleries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub(crate) previous: NodeId,
    pub(crate) next: NodeId,
    pub(crate) dots: Vec<NodeId>,
}

impl Controls {
    pub fn previous(&self) -> NodeId {
        self.previous
    }

    pub fn next(&self) -> NodeId {
        self.next
    }

    pub fn dots(&self) -> &[NodeId] {
        &self.dots
    }
}

/// Normalize any integer index into `[0, len)` with circular wraparound.
///
/// `len` must be non-zero.
pub fn normalize_index(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

/// A live slideshow bound to its region of the document.
#[derive(Debug, Clone)]
pub struct GalleryInstance {
    id: GalleryId,
    region: NodeId,
    track: NodeId,
    slides: Vec<Slide>,
    controls: Option<Controls>,
    current: usize,
    timer: Option<TimerHandle>,
    interval: Duration,
}

impl GalleryInstance {
    pub(crate) fn new(
        id: GalleryId,
        region: NodeId,
        track: NodeId,
        slides: Vec<Slide>,
        controls: Option<Controls>,
        interval: Duration,
    ) -> Self {
        Self {
            id,
            region,
            track,
            slides,
            controls,
            current: 0,
            timer: None,
            interval,
        }
    }

    pub fn id(&self) -> GalleryId {
        self.id
    }

    /// The generated `div.bnuts-gallery` element.
    pub fn region(&self) -> NodeId {
        self.region
    }

    /// The sliding `div.bnuts-slides-wrapper` element.
    pub fn track(&self) -> NodeId {
        self.track
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_multi_slide(&self) -> bool {
        self.slides.len() > 1
    }

    pub fn controls(&self) -> Option<&Controls> {
        self.controls.as_ref()
    }

    /// The live autoplay timer, if any.
    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `None` for static single-slide galleries.
    pub fn autoplay_state(&self) -> Option<AutoplayState> {
        if !self.is_multi_slide() {
            return None;
        }
        Some(match self.timer {
            Some(_) => AutoplayState::Running,
            None => AutoplayState::Paused,
        })
    }

    /// Select a slide, wrapping any index into range, and sync the document.
    pub fn show(&mut self, doc: &mut Document, index: isize) {
        let index = normalize_index(index, self.slides.len());
        self.current = index;
        doc.set_style_property(
            self.track,
            "transform",
            &format!("translateX({}%)", -(index as i64) * 100),
        );
        if let Some(controls) = &self.controls {
            for (i, &dot) in controls.dots.iter().enumerate() {
                doc.toggle_class(dot, "active", i == index);
            }
        }
    }

    /// Handle one interaction event. Returns `false` when the event is ignored.
    pub fn handle<S: Scheduler>(
        &mut self,
        doc: &mut Document,
        scheduler: &mut S,
        event: GalleryEvent,
    ) -> bool {
        if !self.is_multi_slide() {
            return false;
        }
        let current = self.current as isize;
        match event {
            GalleryEvent::Previous | GalleryEvent::KeyDown(Key::ArrowLeft) => {
                self.show(doc, current - 1);
                self.restart_autoplay(scheduler);
            }
            GalleryEvent::Next | GalleryEvent::KeyDown(Key::ArrowRight) => {
                self.show(doc, current + 1);
                self.restart_autoplay(scheduler);
            }
            GalleryEvent::Dot(i) if i < self.slides.len() => {
                self.show(doc, i as isize);
                self.restart_autoplay(scheduler);
            }
            GalleryEvent::Dot(_) | GalleryEvent::KeyDown(Key::Other) => return false,
            GalleryEvent::PointerEnter | GalleryEvent::FocusIn => self.stop_autoplay(scheduler),
            GalleryEvent::PointerLeave | GalleryEvent::FocusOut => self.start_autoplay(scheduler),
        }
        true
    }

    /// Advance on a timer tick. Ticks from a handle this instance no longer
    /// owns are ignored.
    pub fn tick(&mut self, doc: &mut Document, handle: TimerHandle) -> bool {
        self.tick_many(doc, handle, 1)
    }

    /// Advance by `count` ticks of the same timer at once. Only the position
    /// within the cycle matters, so the cost does not depend on `count`.
    pub fn tick_many(&mut self, doc: &mut Document, handle: TimerHandle, count: u64) -> bool {
        if count == 0 || self.timer != Some(handle) {
            return false;
        }
        let step = count % self.slides.len() as u64;
        self.show(doc, self.current as isize + step as isize);
        true
    }

    /// Start autoplay unless it is already running.
    pub fn start_autoplay<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.timer.is_some() || !self.is_multi_slide() {
            return;
        }
        self.timer = Some(scheduler.set_interval(self.id, self.interval));
    }

    pub fn stop_autoplay<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.timer.take() {
            scheduler.clear_interval(handle);
        }
    }

    /// Cancel the current timer, then start a fresh one.
    pub fn restart_autoplay<S: Scheduler>(&mut self, scheduler: &mut S) {
        self.stop_autoplay(scheduler);
        self.start_autoplay(scheduler);
    }

    /// Index of the dot carrying the `active` class, read back from the document.
    pub fn active_dot(&self, doc: &Document) -> Option<usize> {
        self.controls
            .as_ref()?
            .dots
            .iter()
            .position(|&d| doc.has_class(d, "active"))
    }

    /// Number of dots carrying the `active` class.
    pub fn active_dot_count(&self, doc: &Document) -> usize {
        self.controls
            .as_ref()
            .map(|c| c.dots.iter().filter(|&&d| doc.has_class(d, "active")).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::event_loop::EventLoop;
    use crate::test_helpers::{gallery_page, translate_percent};

    fn setup(images: usize) -> (Document, EventLoop, GalleryInstance) {
        let mut doc = Document::parse(&gallery_page(images)).unwrap();
        let mut ev = EventLoop::new();
        let container = find_containers(&doc, "branch-image")[0];
        let gallery = enhance(
            &mut doc,
            container,
            GalleryId(0),
            &GalleryConfig::default(),
            &mut ev,
        )
        .expect("gallery with images");
        (doc, ev, gallery)
    }

    fn tick_until(
        doc: &mut Document,
        ev: &mut EventLoop,
        gallery: &mut GalleryInstance,
        deadline: Duration,
    ) -> usize {
        let mut fired = 0;
        while let Some(tick) = ev.next_due(deadline) {
            if gallery.tick(doc, tick.handle) {
                fired += 1;
            }
        }
        ev.advance_to(deadline);
        fired
    }

    #[test]
    fn normalize_index_wraps_both_ways() {
        assert_eq!(normalize_index(-1, 3), 2);
        assert_eq!(normalize_index(3, 3), 0);
        assert_eq!(normalize_index(0, 3), 0);
        assert_eq!(normalize_index(-7, 3), 2);
        assert_eq!(normalize_index(100, 1), 0);
    }

    #[test]
    fn normalize_index_matches_double_modulo_law() {
        for n in 1..=6usize {
            for k in -20isize..=20 {
                let n_i = n as isize;
                let expected = (((k % n_i) + n_i) % n_i) as usize;
                assert_eq!(normalize_index(k, n), expected, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn show_moves_track_and_dot() {
        let (mut doc, _ev, mut gallery) = setup(3);
        gallery.show(&mut doc, -1);
        assert_eq!(gallery.current_index(), 2);
        assert_eq!(translate_percent(&doc, gallery.track()), -200);
        assert_eq!(gallery.active_dot(&doc), Some(2));
        assert_eq!(gallery.active_dot_count(&doc), 1);

        gallery.show(&mut doc, 3);
        assert_eq!(gallery.current_index(), 0);
        assert_eq!(translate_percent(&doc, gallery.track()), 0);
        assert_eq!(gallery.active_dot(&doc), Some(0));
    }

    #[test]
    fn initial_state_shows_first_slide_and_runs() {
        let (doc, ev, gallery) = setup(3);
        assert_eq!(gallery.current_index(), 0);
        assert_eq!(gallery.active_dot(&doc), Some(0));
        assert_eq!(gallery.active_dot_count(&doc), 1);
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Running));
        assert_eq!(ev.active_count(), 1);
    }

    #[test]
    fn three_nexts_wrap_back_to_start() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        for _ in 0..3 {
            assert!(gallery.handle(&mut doc, &mut ev, GalleryEvent::Next));
        }
        assert_eq!(gallery.current_index(), 0);
        assert_eq!(gallery.active_dot(&doc), Some(0));
    }

    #[test]
    fn previous_from_first_goes_to_last() {
        let (mut doc, mut ev, mut gallery) = setup(4);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::Previous);
        assert_eq!(gallery.current_index(), 3);
    }

    #[test]
    fn arrow_keys_navigate_and_other_keys_are_ignored() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        assert!(gallery.handle(&mut doc, &mut ev, GalleryEvent::KeyDown(Key::ArrowRight)));
        assert_eq!(gallery.current_index(), 1);
        assert!(gallery.handle(&mut doc, &mut ev, GalleryEvent::KeyDown(Key::ArrowLeft)));
        assert_eq!(gallery.current_index(), 0);
        assert!(!gallery.handle(&mut doc, &mut ev, GalleryEvent::KeyDown(Key::Other)));
        assert_eq!(gallery.current_index(), 0);
    }

    #[test]
    fn dot_selects_its_slide() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        assert!(gallery.handle(&mut doc, &mut ev, GalleryEvent::Dot(2)));
        assert_eq!(gallery.current_index(), 2);
        assert!(!gallery.handle(&mut doc, &mut ev, GalleryEvent::Dot(3)));
        assert_eq!(gallery.current_index(), 2);
    }

    #[test]
    fn autoplay_advances_every_interval() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        let fired = tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(8));
        assert_eq!(fired, 2);
        assert_eq!(gallery.current_index(), 2);
        tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(12));
        assert_eq!(gallery.current_index(), 0);
    }

    #[test]
    fn pointer_enter_pauses_and_leave_resumes() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::PointerEnter);
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Paused));
        assert_eq!(ev.active_count(), 0);

        let fired = tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(20));
        assert_eq!(fired, 0);
        assert_eq!(gallery.current_index(), 0);

        gallery.handle(&mut doc, &mut ev, GalleryEvent::PointerLeave);
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Running));
        let fired = tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(24));
        assert_eq!(fired, 1);
        assert_eq!(gallery.current_index(), 1);
    }

    #[test]
    fn focus_pauses_like_pointer() {
        let (mut doc, mut ev, mut gallery) = setup(2);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::FocusIn);
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Paused));
        gallery.handle(&mut doc, &mut ev, GalleryEvent::FocusOut);
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Running));
    }

    #[test]
    fn leave_while_running_keeps_single_timer() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        let before = gallery.timer();
        gallery.handle(&mut doc, &mut ev, GalleryEvent::PointerLeave);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::FocusOut);
        assert_eq!(gallery.timer(), before);
        assert_eq!(ev.active_for(gallery.id()), 1);
    }

    #[test]
    fn manual_navigation_restarts_full_interval() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(3));
        let old = gallery.timer().unwrap();
        gallery.handle(&mut doc, &mut ev, GalleryEvent::Next);
        let new = gallery.timer().unwrap();
        assert_ne!(old, new);
        assert!(!ev.is_active(old));
        assert_eq!(ev.active_for(gallery.id()), 1);

        // The stale timer would have fired at t=4s; the fresh one fires at t=7s.
        assert_eq!(tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(6)), 0);
        assert_eq!(gallery.current_index(), 1);
        assert_eq!(tick_until(&mut doc, &mut ev, &mut gallery, Duration::from_secs(7)), 1);
        assert_eq!(gallery.current_index(), 2);
    }

    #[test]
    fn manual_navigation_while_paused_resumes() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::PointerEnter);
        gallery.handle(&mut doc, &mut ev, GalleryEvent::Dot(1));
        assert_eq!(gallery.autoplay_state(), Some(AutoplayState::Running));
    }

    #[test]
    fn stale_tick_is_ignored() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        let old = gallery.timer().unwrap();
        gallery.restart_autoplay(&mut ev);
        assert!(!gallery.tick(&mut doc, old));
        assert_eq!(gallery.current_index(), 0);
    }

    #[test]
    fn many_ticks_land_on_cycle_position() {
        let (mut doc, _ev, mut gallery) = setup(3);
        let handle = gallery.timer().unwrap();
        assert!(gallery.tick_many(&mut doc, handle, 100_000));
        assert_eq!(gallery.current_index(), 1);
        assert_eq!(translate_percent(&doc, gallery.track()), -100);
        assert!(gallery.tick_many(&mut doc, handle, 3));
        assert_eq!(gallery.current_index(), 1);
        assert!(!gallery.tick_many(&mut doc, handle, 0));
    }

    #[test]
    fn many_ticks_from_stale_timer_are_ignored() {
        let (mut doc, mut ev, mut gallery) = setup(3);
        let old = gallery.timer().unwrap();
        gallery.restart_autoplay(&mut ev);
        assert!(!gallery.tick_many(&mut doc, old, 5));
        assert_eq!(gallery.current_index(), 0);
    }

    #[test]
    fn single_slide_ignores_everything() {
        let (mut doc, mut ev, mut gallery) = setup(1);
        assert!(!gallery.is_multi_slide());
        assert_eq!(gallery.autoplay_state(), None);
        assert_eq!(ev.active_count(), 0);
        for event in [
            GalleryEvent::Next,
            GalleryEvent::Previous,
            GalleryEvent::Dot(0),
            GalleryEvent::PointerLeave,
        ] {
            assert!(!gallery.handle(&mut doc, &mut ev, event));
        }
        assert_eq!(ev.active_count(), 0);
        assert_eq!(gallery.current_index(), 0);
    }
}
