//! A loaded page: document, event loop, galleries and site behaviors.
//!
//! [`Page::ready`] is the page-ready boot. It injects the gallery stylesheet,
//! enhances every image-group container and attaches the site behaviors.
//! Running it again is harmless: the stylesheet is found and skipped,
//! enhanced containers are recognised, and site behaviors attach only once,
//! so content appended later can be enhanced by calling `ready` again.
//!
//! After boot, the page routes events to their owner:
//!
//! ```text
//! dispatch(gallery, event) ──▶ GalleryInstance::handle
//! advance(duration)        ──▶ EventLoop ticks ──▶ GalleryInstance::tick
//! dispatch_site(event)     ──▶ MobileMenu / CookieNotice
//! click_anchor(a)          ──▶ SmoothScroll
//! ```

use crate::config::SiteConfig;
use crate::dom::{Document, DomError, NodeId};
use crate::event_loop::EventLoop;
use crate::gallery::{self, AutoplayState, GalleryEvent, GalleryId, GalleryInstance};
use crate::site::{Environment, FlagStore, MemoryStore, ScrollAction, SiteBehaviors};
use crate::styles;
use log::debug;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("no gallery {0} on this page")]
    UnknownGallery(usize),
    #[error("invalid step '{0}'")]
    InvalidStep(String),
}

/// What one run of [`Page::ready`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootReport {
    pub styles_injected: bool,
    pub galleries_enhanced: usize,
}

/// Site-level interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEvent {
    /// Click on the mobile menu toggle.
    MenuToggleClick,
    /// Key pressed while the menu toggle has focus.
    MenuToggleKey(String),
    /// Click on the nth link (0-based) inside the nav.
    NavLinkClick(usize),
    /// Key pressed anywhere in the document.
    DocumentKey(String),
    /// Click on the cookie accept button.
    AcceptCookies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GallerySummary {
    pub slides: usize,
    pub captions: usize,
    pub current: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<AutoplayState>,
}

impl GallerySummary {
    pub fn of(gallery: &GalleryInstance) -> Self {
        Self {
            slides: gallery.slide_count(),
            captions: gallery
                .slides()
                .iter()
                .filter(|s| s.caption().is_some())
                .count(),
            current: gallery.current_index(),
            autoplay: gallery.autoplay_state(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub galleries: Vec<GallerySummary>,
    pub styles_injected: bool,
    pub mobile_menu: bool,
    pub cookie_notice: bool,
}

pub struct Page {
    doc: Document,
    scheduler: EventLoop,
    galleries: Vec<GalleryInstance>,
    site: Option<SiteBehaviors>,
    store: Box<dyn FlagStore>,
    env: Environment,
    config: SiteConfig,
    focused: Option<NodeId>,
    styles_injected: bool,
}

impl Page {
    /// Wrap a parsed document. Nothing is enhanced until [`Page::ready`].
    pub fn new(doc: Document, config: SiteConfig) -> Self {
        Self {
            doc,
            scheduler: EventLoop::new(),
            galleries: Vec::new(),
            site: None,
            store: Box::new(MemoryStore::new()),
            env: Environment::default(),
            config,
            focused: None,
            styles_injected: false,
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_store(mut self, store: Box<dyn FlagStore>) -> Self {
        self.store = store;
        self
    }

    /// Parse `html` without booting it.
    pub fn parse(html: &str, config: SiteConfig) -> Result<Self, PageError> {
        Ok(Self::new(Document::parse(html)?, config))
    }

    /// Parse `html` and run the page-ready boot with default environment.
    pub fn load(html: &str, config: SiteConfig) -> Result<Self, PageError> {
        let mut page = Self::parse(html, config)?;
        page.ready();
        Ok(page)
    }

    /// The page-ready boot. Safe to call more than once.
    pub fn ready(&mut self) -> BootReport {
        let css = styles::generate_gallery_css(&self.config.gallery);
        let styles_injected = styles::inject_once(&mut self.doc, &css);
        self.styles_injected |= styles_injected;

        let containers =
            gallery::find_containers(&self.doc, &self.config.gallery.container_class);
        let mut galleries_enhanced = 0;
        for container in containers {
            let id = GalleryId(self.galleries.len());
            if let Some(instance) = gallery::enhance(
                &mut self.doc,
                container,
                id,
                &self.config.gallery,
                &mut self.scheduler,
            ) {
                self.galleries.push(instance);
                galleries_enhanced += 1;
            }
        }

        if self.site.is_none() {
            self.site = Some(SiteBehaviors::attach(
                &mut self.doc,
                &self.config.behaviors,
                &self.env,
                self.store.as_ref(),
            ));
        }

        debug!(
            "page ready: {} galleries enhanced, styles injected: {}",
            galleries_enhanced, styles_injected
        );
        BootReport {
            styles_injected,
            galleries_enhanced,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for content added after boot. Call [`Page::ready`]
    /// again to enhance it.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn scheduler(&self) -> &EventLoop {
        &self.scheduler
    }

    pub fn galleries(&self) -> &[GalleryInstance] {
        &self.galleries
    }

    pub fn gallery(&self, index: usize) -> Option<&GalleryInstance> {
        self.galleries.get(index)
    }

    pub fn site(&self) -> Option<&SiteBehaviors> {
        self.site.as_ref()
    }

    /// Element that holds keyboard focus after the last site interaction.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Virtual time since the page loaded.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn to_html(&self) -> String {
        self.doc.to_html()
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            galleries: self.galleries.iter().map(GallerySummary::of).collect(),
            styles_injected: self.styles_injected,
            mobile_menu: self.site.as_ref().is_some_and(|s| s.menu.is_some()),
            cookie_notice: self.site.as_ref().is_some_and(|s| s.cookies.is_some()),
        }
    }

    pub fn menu_open(&self) -> Option<bool> {
        let menu = self.site.as_ref()?.menu.as_ref()?;
        Some(menu.is_open(&self.doc))
    }

    pub fn cookie_notice_visible(&self) -> Option<bool> {
        let notice = self.site.as_ref()?.cookies.as_ref()?;
        Some(notice.is_visible(&self.doc))
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Send an interaction event to one gallery. Returns whether it was handled.
    pub fn dispatch(&mut self, gallery: usize, event: GalleryEvent) -> Result<bool, PageError> {
        let instance = self
            .galleries
            .get_mut(gallery)
            .ok_or(PageError::UnknownGallery(gallery))?;
        Ok(instance.handle(&mut self.doc, &mut self.scheduler, event))
    }

    /// Let virtual time pass, delivering every autoplay tick that falls due.
    /// Returns the number of ticks that advanced a gallery.
    ///
    /// Ticks only move slides and never touch timers, so each gallery takes
    /// all of its ticks for the window at once.
    pub fn advance(&mut self, by: Duration) -> u64 {
        let deadline = self.scheduler.now().saturating_add(by);
        let mut advanced = 0;
        for run in self.scheduler.run_until(deadline) {
            let Some(instance) = self.galleries.get_mut(run.owner.0) else {
                continue;
            };
            if instance.tick_many(&mut self.doc, run.handle, run.count) {
                advanced += run.count;
            }
        }
        advanced
    }

    /// Send a site-level event. Returns whether any behavior reacted.
    pub fn dispatch_site(&mut self, event: SiteEvent) -> bool {
        let Some(site) = &self.site else {
            return false;
        };
        match event {
            SiteEvent::MenuToggleClick => {
                let Some(menu) = &site.menu else {
                    return false;
                };
                if let Some(focus) = menu.toggle(&mut self.doc) {
                    self.focused = Some(focus);
                }
                true
            }
            SiteEvent::MenuToggleKey(key) => {
                let Some(menu) = &site.menu else {
                    return false;
                };
                match menu.toggle_key(&mut self.doc, &key) {
                    Some(focus) => {
                        if focus.is_some() {
                            self.focused = focus;
                        }
                        true
                    }
                    None => false,
                }
            }
            SiteEvent::NavLinkClick(index) => {
                let Some(menu) = &site.menu else {
                    return false;
                };
                if index >= menu.links(&self.doc).len() {
                    return false;
                }
                menu.link_followed(&mut self.doc);
                true
            }
            SiteEvent::DocumentKey(key) => {
                let Some(menu) = &site.menu else {
                    return false;
                };
                match menu.document_key(&mut self.doc, &key) {
                    Some(focus) => {
                        self.focused = Some(focus);
                        true
                    }
                    None => false,
                }
            }
            SiteEvent::AcceptCookies => match &site.cookies {
                Some(notice) => notice.accept(&mut self.doc, self.store.as_mut()),
                None => false,
            },
        }
    }

    /// Decide what a click on `anchor` does.
    pub fn click_anchor(&self, anchor: NodeId) -> ScrollAction {
        match &self.site {
            Some(site) => site.scroll.click(&self.doc, anchor),
            None => ScrollAction::Follow,
        }
    }
}
