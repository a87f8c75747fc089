//! Site-wide behaviors that share the page-ready boot with the galleries.
//!
//! - [`MobileMenu`]: accessible menu toggle (ARIA state, focus management,
//!   Escape to close).
//! - [`SmoothScroll`]: same-page anchors scroll smoothly unless the visitor
//!   prefers reduced motion.
//! - [`CookieNotice`]: shown until accepted once; acceptance is the single
//!   persisted flag, kept in a [`FlagStore`].
//!
//! Each behavior attaches only when its elements exist. Environment failures
//! (unsupported motion query, unavailable storage) turn the behavior into a
//! no-op instead of surfacing an error.

use crate::config::BehaviorConfig;
use crate::dom::{Document, NodeId};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value storage for persisted flags.
pub trait FlagStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Flags held for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Flags persisted as a JSON object in a file. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl FlagStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Storage that always fails, like `localStorage` in a locked-down browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl FlagStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

/// Capabilities and preferences of the environment the page runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// Whether the renderer supports smooth scrolling at all.
    pub supports_smooth_scroll: bool,
    /// Reduced-motion preference; `None` when the query is unsupported.
    pub prefers_reduced_motion: Option<bool>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            supports_smooth_scroll: true,
            prefers_reduced_motion: Some(false),
        }
    }
}

// =============================================================================
// Mobile menu
// =============================================================================

#[derive(Debug, Clone)]
pub struct MobileMenu {
    toggle: NodeId,
    nav: NodeId,
}

impl MobileMenu {
    /// Wire up the toggle and nav if both exist.
    pub fn attach(doc: &mut Document, config: &BehaviorConfig) -> Option<Self> {
        let toggle = doc.element_by_id(&config.menu_toggle_id)?;
        let nav = doc.element_by_id(&config.nav_id)?;
        let menu = Self { toggle, nav };

        doc.set_attr(toggle, "role", "button");
        doc.set_attr(toggle, "aria-controls", &config.nav_id);
        menu.sync_expanded(doc);
        doc.set_attr(toggle, "tabindex", "0");
        Some(menu)
    }

    pub fn toggle_element(&self) -> NodeId {
        self.toggle
    }

    pub fn nav_element(&self) -> NodeId {
        self.nav
    }

    pub fn links(&self, doc: &Document) -> Vec<NodeId> {
        doc.elements_by_tag(self.nav, "a")
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_class(self.nav, "active")
    }

    fn sync_expanded(&self, doc: &mut Document) {
        let expanded = if self.is_open(doc) { "true" } else { "false" };
        doc.set_attr(self.toggle, "aria-expanded", expanded);
    }

    /// Open the menu. Returns the element that should receive focus.
    pub fn open(&self, doc: &mut Document) -> Option<NodeId> {
        doc.add_class(self.nav, "active");
        self.sync_expanded(doc);
        self.links(doc).first().copied()
    }

    /// Close the menu. Focus returns to the toggle.
    pub fn close(&self, doc: &mut Document) -> NodeId {
        doc.remove_class(self.nav, "active");
        self.sync_expanded(doc);
        self.toggle
    }

    /// Flip open/closed. Returns the element that should receive focus.
    pub fn toggle(&self, doc: &mut Document) -> Option<NodeId> {
        if self.is_open(doc) {
            Some(self.close(doc))
        } else {
            self.open(doc)
        }
    }

    /// Key pressed while the toggle has focus. Enter and Space toggle.
    pub fn toggle_key(&self, doc: &mut Document, key: &str) -> Option<Option<NodeId>> {
        matches!(key, "Enter" | " ").then(|| self.toggle(doc))
    }

    /// A nav link was followed. Closes the menu without moving focus.
    pub fn link_followed(&self, doc: &mut Document) {
        doc.remove_class(self.nav, "active");
        self.sync_expanded(doc);
    }

    /// Document-level keydown. Escape closes an open menu.
    pub fn document_key(&self, doc: &mut Document, key: &str) -> Option<NodeId> {
        (key == "Escape" && self.is_open(doc)).then(|| self.close(doc))
    }
}

// =============================================================================
// Smooth scroll
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Let the browser follow the link normally.
    Follow,
    /// Prevent default navigation and smoothly scroll the element into view.
    SmoothScrollTo(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothScroll {
    enabled: bool,
}

impl SmoothScroll {
    pub fn new(env: &Environment) -> Self {
        let enabled = match env.prefers_reduced_motion {
            Some(reduced) => env.supports_smooth_scroll && !reduced,
            None => false,
        };
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide what a click on `anchor` does.
    pub fn click(&self, doc: &Document, anchor: NodeId) -> ScrollAction {
        if !self.enabled {
            return ScrollAction::Follow;
        }
        let Some(href) = doc.attr(anchor, "href") else {
            return ScrollAction::Follow;
        };
        match href.strip_prefix('#') {
            Some(id) if !id.is_empty() => doc
                .element_by_id(id)
                .map_or(ScrollAction::Follow, ScrollAction::SmoothScrollTo),
            _ => ScrollAction::Follow,
        }
    }
}

// =============================================================================
// Cookie notice
// =============================================================================

#[derive(Debug, Clone)]
pub struct CookieNotice {
    notice: NodeId,
    accept: NodeId,
    flag: String,
}

impl CookieNotice {
    /// Show the notice unless the flag is already set.
    ///
    /// Returns `None` if either element is missing or the store cannot be
    /// read; the notice then keeps whatever visibility the markup gives it.
    pub fn attach(
        doc: &mut Document,
        config: &BehaviorConfig,
        store: &dyn FlagStore,
    ) -> Option<Self> {
        let notice = doc.element_by_id(&config.cookie_notice_id)?;
        let accept = doc.element_by_id(&config.cookie_accept_id)?;
        let accepted = store.get(&config.cookie_flag).ok()?;
        if accepted.is_none_or(|v| v.is_empty()) {
            doc.set_style_property(notice, "display", "block");
        }
        Some(Self {
            notice,
            accept,
            flag: config.cookie_flag.clone(),
        })
    }

    pub fn notice_element(&self) -> NodeId {
        self.notice
    }

    pub fn accept_element(&self) -> NodeId {
        self.accept
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.style_property(self.notice, "display").as_deref() == Some("block")
    }

    /// Record acceptance and hide the notice. A failing store leaves the
    /// notice as it is.
    pub fn accept(&self, doc: &mut Document, store: &mut dyn FlagStore) -> bool {
        if store.set(&self.flag, "true").is_err() {
            return false;
        }
        doc.set_style_property(self.notice, "display", "none");
        true
    }
}

/// Every site behavior attached to one page.
#[derive(Debug, Clone)]
pub struct SiteBehaviors {
    pub menu: Option<MobileMenu>,
    pub scroll: SmoothScroll,
    pub cookies: Option<CookieNotice>,
}

impl SiteBehaviors {
    pub fn attach(
        doc: &mut Document,
        config: &BehaviorConfig,
        env: &Environment,
        store: &dyn FlagStore,
    ) -> Self {
        Self {
            menu: MobileMenu::attach(doc, config),
            scroll: SmoothScroll::new(env),
            cookies: CookieNotice::attach(doc, config, store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MENU_PAGE: &str = r##"<body>
<span id="mobileMenuToggle">Menu</span>
<nav id="mainNav"><a href="#about">About</a><a href="#contact">Contact</a></nav>
<section id="about"></section>
</body>"##;

    const COOKIE_PAGE: &str = r#"<div id="cookie-notice" style="display: none">We use cookies <button id="cookie-accept">OK</button></div>"#;

    fn menu_doc() -> (Document, MobileMenu) {
        let mut doc = Document::parse(MENU_PAGE).unwrap();
        let menu = MobileMenu::attach(&mut doc, &BehaviorConfig::default()).unwrap();
        (doc, menu)
    }

    #[test]
    fn menu_attach_sets_aria_attributes() {
        let (doc, menu) = menu_doc();
        let toggle = menu.toggle_element();
        assert_eq!(doc.attr(toggle, "role"), Some("button"));
        assert_eq!(doc.attr(toggle, "aria-controls"), Some("mainNav"));
        assert_eq!(doc.attr(toggle, "aria-expanded"), Some("false"));
        assert_eq!(doc.attr(toggle, "tabindex"), Some("0"));
    }

    #[test]
    fn menu_attach_reflects_initially_open_nav() {
        let html = MENU_PAGE.replace("id=\"mainNav\"", "id=\"mainNav\" class=\"active\"");
        let mut doc = Document::parse(&html).unwrap();
        let menu = MobileMenu::attach(&mut doc, &BehaviorConfig::default()).unwrap();
        assert_eq!(doc.attr(menu.toggle_element(), "aria-expanded"), Some("true"));
    }

    #[test]
    fn menu_missing_elements_is_no_op() {
        let mut doc = Document::parse("<nav id=\"mainNav\"></nav>").unwrap();
        assert!(MobileMenu::attach(&mut doc, &BehaviorConfig::default()).is_none());
        assert_eq!(doc.to_html(), "<nav id=\"mainNav\"></nav>");
    }

    #[test]
    fn menu_toggle_opens_and_focuses_first_link() {
        let (mut doc, menu) = menu_doc();
        let focus = menu.toggle(&mut doc);
        assert!(menu.is_open(&doc));
        assert_eq!(doc.attr(menu.toggle_element(), "aria-expanded"), Some("true"));
        assert_eq!(focus, menu.links(&doc).first().copied());

        let focus = menu.toggle(&mut doc);
        assert!(!menu.is_open(&doc));
        assert_eq!(focus, Some(menu.toggle_element()));
    }

    #[test]
    fn menu_keys_enter_and_space_toggle() {
        let (mut doc, menu) = menu_doc();
        assert!(menu.toggle_key(&mut doc, "Enter").is_some());
        assert!(menu.is_open(&doc));
        assert!(menu.toggle_key(&mut doc, " ").is_some());
        assert!(!menu.is_open(&doc));
        assert!(menu.toggle_key(&mut doc, "a").is_none());
    }

    #[test]
    fn escape_closes_only_when_open() {
        let (mut doc, menu) = menu_doc();
        assert_eq!(menu.document_key(&mut doc, "Escape"), None);
        menu.open(&mut doc);
        assert_eq!(
            menu.document_key(&mut doc, "Escape"),
            Some(menu.toggle_element())
        );
        assert!(!menu.is_open(&doc));
    }

    #[test]
    fn following_link_closes_menu() {
        let (mut doc, menu) = menu_doc();
        menu.open(&mut doc);
        menu.link_followed(&mut doc);
        assert!(!menu.is_open(&doc));
        assert_eq!(doc.attr(menu.toggle_element(), "aria-expanded"), Some("false"));
    }

    #[test]
    fn smooth_scroll_targets_existing_anchor() {
        let doc = Document::parse(MENU_PAGE).unwrap();
        let scroll = SmoothScroll::new(&Environment::default());
        let links = doc.elements_by_tag(doc.root(), "a");
        let about = doc.element_by_id("about").unwrap();
        assert_eq!(scroll.click(&doc, links[0]), ScrollAction::SmoothScrollTo(about));
        // #contact has no target element
        assert_eq!(scroll.click(&doc, links[1]), ScrollAction::Follow);
    }

    #[test]
    fn smooth_scroll_ignores_bare_hash_and_external_links() {
        let doc = Document::parse("<a href=\"#\">top</a><a href=\"/page\">x</a><a>y</a>").unwrap();
        let scroll = SmoothScroll::new(&Environment::default());
        for a in doc.elements_by_tag(doc.root(), "a") {
            assert_eq!(scroll.click(&doc, a), ScrollAction::Follow);
        }
    }

    #[test]
    fn smooth_scroll_disabled_by_environment() {
        let reduced = Environment {
            prefers_reduced_motion: Some(true),
            ..Environment::default()
        };
        let unsupported_query = Environment {
            prefers_reduced_motion: None,
            ..Environment::default()
        };
        let no_smooth = Environment {
            supports_smooth_scroll: false,
            ..Environment::default()
        };
        for env in [reduced, unsupported_query, no_smooth] {
            assert!(!SmoothScroll::new(&env).is_enabled());
        }
    }

    #[test]
    fn cookie_notice_shown_until_accepted() {
        let mut doc = Document::parse(COOKIE_PAGE).unwrap();
        let mut store = MemoryStore::new();
        let config = BehaviorConfig::default();
        let notice = CookieNotice::attach(&mut doc, &config, &store).unwrap();
        assert!(notice.is_visible(&doc));

        assert!(notice.accept(&mut doc, &mut store));
        assert!(!notice.is_visible(&doc));
        assert_eq!(
            store.get("bnuts_cookies_accepted").unwrap().as_deref(),
            Some("true")
        );

        // Next page load: flag set, notice stays hidden.
        let mut doc = Document::parse(COOKIE_PAGE).unwrap();
        let notice = CookieNotice::attach(&mut doc, &config, &store).unwrap();
        assert!(!notice.is_visible(&doc));
    }

    #[test]
    fn cookie_notice_with_unavailable_store_is_no_op() {
        let mut doc = Document::parse(COOKIE_PAGE).unwrap();
        let before = doc.to_html();
        let attached = CookieNotice::attach(&mut doc, &BehaviorConfig::default(), &UnavailableStore);
        assert!(attached.is_none());
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn cookie_accept_with_failing_store_leaves_notice() {
        let mut doc = Document::parse(COOKIE_PAGE).unwrap();
        let notice =
            CookieNotice::attach(&mut doc, &BehaviorConfig::default(), &MemoryStore::new()).unwrap();
        assert!(!notice.accept(&mut doc, &mut UnavailableStore));
        assert!(notice.is_visible(&doc));
    }

    #[test]
    fn json_file_store_persists_between_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flags.json");
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "true").unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn json_file_store_reports_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flags.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).get("k"),
            Err(StoreError::Json(_))
        ));
    }
}
