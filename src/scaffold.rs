//! Starter pages for trying a gallery out.
//!
//! `slide-gal scaffold hall.jpg="Main hall" lab.jpg` prints a minimal page
//! with one image-group container, ready to be passed to `enhance`.

use maud::{DOCTYPE, Markup, html};
use std::convert::Infallible;
use std::str::FromStr;

/// One image argument: `SRC` or `SRC=ALT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldImage {
    pub src: String,
    pub alt: Option<String>,
}

impl FromStr for ScaffoldImage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once('=') {
            Some((src, alt)) => ScaffoldImage {
                src: src.to_string(),
                alt: Some(alt.to_string()),
            },
            None => ScaffoldImage {
                src: s.to_string(),
                alt: None,
            },
        })
    }
}

/// Render a page holding `images` in a single container of `container_class`.
pub fn render_page(title: &str, container_class: &str, images: &[ScaffoldImage]) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
            }
            body {
                main {
                    h1 { (title) }
                    div class=(container_class) {
                        @for image in images {
                            img src=(image.src) alt=[image.alt.as_deref()];
                        }
                    }
                }
            }
        }
    }
}
