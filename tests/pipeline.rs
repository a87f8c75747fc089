//! End-to-end tests over the `fixtures/site` tree: directory build, page
//! re-enhancement and scripted sessions against the built output.

use slide_gal::build::{self, BuildError};
use slide_gal::config::{self, SiteConfig};
use slide_gal::dom::Document;
use slide_gal::gallery::AutoplayState;
use slide_gal::page::Page;
use slide_gal::session::run_session;
use slide_gal::site::{Environment, JsonFileStore};
use slide_gal::styles::STYLE_MARKER;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site")
}

fn built_site() -> TempDir {
    let out = TempDir::new().unwrap();
    let report = build::build(&fixtures(), out.path(), &SiteConfig::default()).unwrap();
    assert_eq!(report.failures(), 0);
    out
}

fn steps(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn build_reports_every_page_and_asset() {
    let out = TempDir::new().unwrap();
    let report = build::build(&fixtures(), out.path(), &SiteConfig::default()).unwrap();

    let pages: Vec<&Path> = report.pages.iter().map(|p| p.path.as_path()).collect();
    assert_eq!(
        pages,
        vec![
            Path::new("about.htm"),
            Path::new("campus/tour.html"),
            Path::new("index.html"),
        ]
    );
    assert_eq!(
        report.copied,
        vec![PathBuf::from("css/site.css"), PathBuf::from("img/hall.jpg")]
    );
    // index: one gallery; tour: two (the empty container is skipped).
    assert_eq!(report.gallery_count(), 3);
}

#[test]
fn built_pages_carry_one_style_block_each() {
    let out = built_site();
    for page in ["index.html", "campus/tour.html", "about.htm"] {
        let html = fs::read_to_string(out.path().join(page)).unwrap();
        assert_eq!(html.matches(STYLE_MARKER).count(), 1, "{page}");
    }
}

#[test]
fn built_output_is_stable_under_rebuild() {
    let first = built_site();
    let second = TempDir::new().unwrap();
    let report = build::build(first.path(), second.path(), &SiteConfig::default()).unwrap();
    assert_eq!(report.gallery_count(), 0);

    for page in ["index.html", "campus/tour.html"] {
        assert_eq!(
            fs::read_to_string(first.path().join(page)).unwrap(),
            fs::read_to_string(second.path().join(page)).unwrap(),
            "{page}"
        );
    }
}

#[test]
fn tour_page_structure() {
    let out = built_site();
    let html = fs::read_to_string(out.path().join("campus/tour.html")).unwrap();
    let doc = Document::parse(&html).unwrap();

    let regions = doc.elements_by_class(doc.root(), "bnuts-gallery");
    assert_eq!(regions.len(), 2);
    // Multi-slide gallery has controls, the single-image one does not.
    assert_eq!(doc.elements_by_class(regions[0], "bnuts-dot").len(), 2);
    assert!(doc.elements_by_class(regions[1], "bnuts-controls").is_empty());
    // Containers without images keep their content.
    assert!(html.contains("Photos coming soon."));
}

#[test]
fn index_keeps_scripts_and_entities() {
    let out = built_site();
    let html = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(html.contains("if (1 < 2)"));
    assert!(html.contains("Library &amp; study rooms"));
    assert!(html.contains("loading=\"eager\""));
}

#[test]
fn session_against_fixture_page() {
    let html = fs::read_to_string(fixtures().join("index.html")).unwrap();
    let mut page = Page::load(&html, SiteConfig::default()).unwrap();
    let trace = run_session(
        &mut page,
        &steps(&[
            "wait=4000",
            "focus-in",
            "wait=8000",
            "focus-out",
            "prev",
            "menu",
            "escape",
            "anchor=#contact",
            "accept-cookies",
        ]),
    )
    .unwrap();

    let gallery = |i: usize| &trace[i].galleries[0];
    assert_eq!(gallery(1).current, 1);
    assert_eq!(gallery(2).autoplay, Some(AutoplayState::Paused));
    assert_eq!(gallery(3).current, 1);
    assert_eq!(gallery(4).autoplay, Some(AutoplayState::Running));
    assert_eq!(gallery(5).current, 0);
    assert_eq!(trace[6].menu_open, Some(true));
    assert_eq!(trace[7].menu_open, Some(false));
    assert_eq!(trace[8].scroll.as_deref(), Some("smooth:#contact"));
    assert_eq!(trace[0].cookie_notice_visible, Some(true));
    assert_eq!(trace[9].cookie_notice_visible, Some(false));
}

#[test]
fn accepted_cookies_persist_across_visits() {
    let dir = TempDir::new().unwrap();
    let flags = dir.path().join("flags.json");
    let html = fs::read_to_string(fixtures().join("index.html")).unwrap();

    let visit = || {
        let mut page = Page::parse(&html, SiteConfig::default())
            .unwrap()
            .with_store(Box::new(JsonFileStore::new(&flags)));
        page.ready();
        page
    };

    let mut first = visit();
    assert_eq!(first.cookie_notice_visible(), Some(true));
    run_session(&mut first, &steps(&["accept-cookies"])).unwrap();

    let second = visit();
    assert_eq!(second.cookie_notice_visible(), Some(false));
}

#[test]
fn reduced_motion_falls_back_to_native_jumps() {
    let html = fs::read_to_string(fixtures().join("index.html")).unwrap();
    let mut page = Page::parse(&html, SiteConfig::default())
        .unwrap()
        .with_environment(Environment {
            prefers_reduced_motion: Some(true),
            ..Environment::default()
        });
    page.ready();
    let trace = run_session(&mut page, &steps(&["anchor=#campus"])).unwrap();
    assert_eq!(trace[1].scroll.as_deref(), Some("follow"));
}

#[test]
fn config_file_overrides_container_class_and_interval() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("slide-gal.toml");
    fs::write(
        &path,
        "[gallery]\ncontainer_class = \"photos\"\nautoplay_interval_ms = 1000\n",
    )
    .unwrap();
    let config = config::load_config(&path).unwrap();

    let html = "<body><div class=\"photos\"><img src=\"a.jpg\"><img src=\"b.jpg\"></div>\
                <div class=\"branch-image\"><img src=\"c.jpg\"></div></body>";
    let mut page = Page::load(html, config).unwrap();
    assert_eq!(page.galleries().len(), 1);
    let trace = run_session(&mut page, &steps(&["wait=1000"])).unwrap();
    assert_eq!(trace[1].galleries[0].current, 1);
}

#[test]
fn broken_page_does_not_stop_siblings() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(
        src.path().join("good.html"),
        "<div class=\"branch-image\"><img src=\"a.jpg\"></div>",
    )
    .unwrap();
    fs::write(src.path().join("bad.html"), "<p>ok</p><!-- never closed").unwrap();

    let report = build::build(src.path(), out.path(), &SiteConfig::default()).unwrap();
    assert_eq!(report.failures(), 1);
    let bad = &report.pages[0];
    assert_eq!(bad.path, PathBuf::from("bad.html"));
    assert!(matches!(bad.result, Err(BuildError::Page(_))));
    assert!(out.path().join("good.html").exists());
    assert!(!out.path().join("bad.html").exists());
}
