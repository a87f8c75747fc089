//! Scripted interaction sessions.
//!
//! A session is a list of steps replayed against a booted [`Page`], each
//! producing a [`TraceEntry`] snapshot. Steps are short strings so they can
//! be passed on the command line:
//!
//! | Step | Meaning |
//! |------|---------|
//! | `next`, `prev` | click a gallery's next/previous control |
//! | `dot=N` | click the dot for slide N (1-based, as labelled) |
//! | `key=NAME` | keydown inside a gallery (`ArrowLeft`, `ArrowRight`, ...) |
//! | `enter`, `leave` | pointer enters/leaves a gallery |
//! | `focus-in`, `focus-out` | keyboard focus enters/leaves a gallery |
//! | `wait=MS` | let MS milliseconds of virtual time pass |
//! | `menu` | click the mobile menu toggle |
//! | `menu-key=NAME` | keydown on the menu toggle (`Enter`, `Space`) |
//! | `nav-link=N` | follow the Nth nav link (1-based) |
//! | `escape` | press Escape anywhere |
//! | `anchor=HREF` | click the first link with that `href` |
//! | `accept-cookies` | click the cookie accept button |
//!
//! Gallery steps target the first gallery unless suffixed with `@G`
//! (0-based gallery index): `next@1`, `dot=3@2`.

use crate::gallery::{GalleryEvent, Key};
use crate::page::{GallerySummary, Page, PageError, SiteEvent};
use crate::site::ScrollAction;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Gallery { target: usize, event: GalleryEvent },
    Wait(Duration),
    Site(SiteEvent),
    Anchor(String),
}

impl FromStr for Step {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PageError::InvalidStep(s.to_string());
        let (body, target) = match s.rsplit_once('@') {
            Some((body, target)) => (body, Some(target.parse::<usize>().map_err(|_| invalid())?)),
            None => (s, None),
        };
        let (name, arg) = match body.split_once('=') {
            Some((name, arg)) => (name, Some(arg)),
            None => (body, None),
        };

        let gallery = |event| Step::Gallery {
            target: target.unwrap_or(0),
            event,
        };
        let step = match (name, arg) {
            ("next", None) => gallery(GalleryEvent::Next),
            ("prev", None) => gallery(GalleryEvent::Previous),
            ("dot", Some(n)) => {
                let n: usize = n.parse().map_err(|_| invalid())?;
                let index = n.checked_sub(1).ok_or_else(invalid)?;
                gallery(GalleryEvent::Dot(index))
            }
            ("key", Some(key)) => gallery(GalleryEvent::KeyDown(Key::from_name(key))),
            ("enter", None) => gallery(GalleryEvent::PointerEnter),
            ("leave", None) => gallery(GalleryEvent::PointerLeave),
            ("focus-in", None) => gallery(GalleryEvent::FocusIn),
            ("focus-out", None) => gallery(GalleryEvent::FocusOut),
            ("wait", Some(ms)) if target.is_none() => {
                Step::Wait(Duration::from_millis(ms.parse().map_err(|_| invalid())?))
            }
            ("menu", None) if target.is_none() => Step::Site(SiteEvent::MenuToggleClick),
            ("menu-key", Some(key)) if target.is_none() => {
                Step::Site(SiteEvent::MenuToggleKey(key_name(key)))
            }
            ("nav-link", Some(n)) if target.is_none() => {
                let n: usize = n.parse().map_err(|_| invalid())?;
                let index = n.checked_sub(1).ok_or_else(invalid)?;
                Step::Site(SiteEvent::NavLinkClick(index))
            }
            ("escape", None) if target.is_none() => {
                Step::Site(SiteEvent::DocumentKey("Escape".to_string()))
            }
            ("anchor", Some(href)) if target.is_none() => Step::Anchor(href.to_string()),
            ("accept-cookies", None) if target.is_none() => Step::Site(SiteEvent::AcceptCookies),
            _ => return Err(invalid()),
        };
        Ok(step)
    }
}

/// `Space` on the command line stands for the `" "` key value.
fn key_name(name: &str) -> String {
    match name {
        "Space" => " ".to_string(),
        other => other.to_string(),
    }
}

/// Page state after one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub step: String,
    pub at_ms: u64,
    pub galleries: Vec<GallerySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_notice_visible: Option<bool>,
    /// `"smooth:#id"` or `"follow"` for anchor steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<String>,
}

fn snapshot(page: &Page, step: &str, scroll: Option<String>) -> TraceEntry {
    TraceEntry {
        step: step.to_string(),
        at_ms: page.now().as_millis() as u64,
        galleries: page.summary().galleries,
        menu_open: page.menu_open(),
        cookie_notice_visible: page.cookie_notice_visible(),
        scroll,
    }
}

/// Apply one step. Returns the scroll decision for anchor steps.
pub fn apply(page: &mut Page, step: &Step) -> Result<Option<String>, PageError> {
    match step {
        Step::Gallery { target, event } => {
            page.dispatch(*target, *event)?;
        }
        Step::Wait(duration) => {
            page.advance(*duration);
        }
        Step::Site(event) => {
            page.dispatch_site(event.clone());
        }
        Step::Anchor(href) => {
            let doc = page.document();
            let Some(anchor) = doc.elements_by_attr(doc.root(), "href", href).first().copied()
            else {
                return Ok(Some("follow".to_string()));
            };
            let outcome = match page.click_anchor(anchor) {
                ScrollAction::Follow => "follow".to_string(),
                ScrollAction::SmoothScrollTo(target) => {
                    format!("smooth:#{}", doc.attr(target, "id").unwrap_or_default())
                }
            };
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}

/// Parse and replay `steps`, recording the state before the first step and
/// after each one.
pub fn run_session(page: &mut Page, steps: &[String]) -> Result<Vec<TraceEntry>, PageError> {
    let parsed: Vec<Step> = steps
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_, _>>()?;

    let mut trace = vec![snapshot(page, "load", None)];
    for (raw, step) in steps.iter().zip(&parsed) {
        let scroll = apply(page, step)?;
        trace.push(snapshot(page, raw, scroll));
    }
    Ok(trace)
}
