use clap::{Parser, Subcommand};
use slide_gal::page::Page;
use slide_gal::scaffold::{self, ScaffoldImage};
use slide_gal::site::{Environment, FlagStore, JsonFileStore, MemoryStore};
use slide_gal::{build, config, output, session};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "slide-gal")]
#[command(about = "Turn image groups in HTML pages into slideshow galleries")]
#[command(long_about = "\
Turn image groups in HTML pages into slideshow galleries

Every element with the container class (default `branch-image`) holding
one or more <img> becomes a slideshow: slides with captions from alt text,
previous/next buttons, dot indicators and autoplay that pauses while the
pointer or keyboard focus is inside.

  <div class=\"branch-image\">          <div class=\"branch-image\">
    <img src=\"hall.jpg\" alt=\"Hall\">  ─▶   <div class=\"bnuts-gallery\">...</div>
    <img src=\"lab.jpg\">                </div>
  </div>

The site's mobile menu, smooth in-page scrolling and cookie notice are
attached too, and `simulate` replays clicks, keys and elapsed time against
a page to show what a visitor would see.

Run 'slide-gal gen-config' to generate a documented slide-gal.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (optional; stock defaults apply when missing)
    #[arg(long, default_value = "slide-gal.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enhance one HTML page
    Enhance {
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Enhance every page in a directory, copying other files
    Build {
        #[arg(long, default_value = "site")]
        source: PathBuf,
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Report the galleries and site behaviors a page would get
    Check { input: PathBuf },
    /// Replay interaction steps against a page
    #[command(long_about = "\
Replay interaction steps against a page and print the state after each.

Steps:
  next, prev            click a gallery's next/previous button
  dot=N                 click the dot for slide N
  key=NAME              keydown in a gallery (ArrowLeft, ArrowRight)
  enter, leave          pointer enters/leaves a gallery
  focus-in, focus-out   keyboard focus enters/leaves a gallery
  wait=MS               let MS milliseconds pass
  menu                  click the mobile menu toggle
  menu-key=NAME         keydown on the menu toggle (Enter, Space)
  nav-link=N            follow the Nth nav link
  escape                press Escape
  anchor=HREF           click the first link with that href
  accept-cookies        click the cookie accept button

Gallery steps go to the first gallery unless suffixed @G (0-based):
  slide-gal simulate index.html next@1 wait=4000 dot=2@0")]
    Simulate {
        input: PathBuf,
        steps: Vec<String>,
        /// Print the trace as JSON
        #[arg(long)]
        json: bool,
        /// Act as if the visitor prefers reduced motion
        #[arg(long)]
        reduced_motion: bool,
        /// Persist site flags (cookie acceptance) in this JSON file
        #[arg(long)]
        flag_file: Option<PathBuf>,
    },
    /// Print a starter page with one gallery
    Scaffold {
        #[arg(long, default_value = "Gallery")]
        title: String,
        /// Images as SRC or SRC=ALT
        #[arg(required = true)]
        images: Vec<ScaffoldImage>,
    },
    /// Print a stock slide-gal.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Enhance { input, output } => {
            let site_config = config::load_config(&cli.config)?;
            let enhanced = build::enhance_file(&input, &site_config)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &enhanced.html)?;
                    println!("==> {} → {}", input.display(), path.display());
                    output::print_check_output(&enhanced.summary);
                }
                None => print!("{}", enhanced.html),
            }
        }
        Command::Build { source, output } => {
            let site_config = config::load_config(&cli.config)?;
            init_thread_pool(&site_config.processing);
            println!("==> Building {} → {}", source.display(), output.display());
            let report = build::build(&source, &output, &site_config)?;
            output::print_build_report(&report, &output);
            if report.failures() > 0 {
                return Err(format!("{} page(s) failed", report.failures()).into());
            }
        }
        Command::Check { input } => {
            let site_config = config::load_config(&cli.config)?;
            println!("==> Checking {}", input.display());
            let enhanced = build::enhance_file(&input, &site_config)?;
            output::print_check_output(&enhanced.summary);
        }
        Command::Simulate {
            input,
            steps,
            json,
            reduced_motion,
            flag_file,
        } => {
            let site_config = config::load_config(&cli.config)?;
            let html = std::fs::read_to_string(&input)?;
            let env = Environment {
                prefers_reduced_motion: Some(reduced_motion),
                ..Environment::default()
            };
            let store: Box<dyn FlagStore> = match flag_file {
                Some(path) => Box::new(JsonFileStore::new(path)),
                None => Box::new(MemoryStore::new()),
            };
            let mut page = Page::parse(&html, site_config)?
                .with_environment(env)
                .with_store(store);
            page.ready();
            let trace = session::run_session(&mut page, &steps)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                output::print_trace(&trace);
            }
        }
        Command::Scaffold { title, images } => {
            let site_config = config::load_config(&cli.config)?;
            let page = scaffold::render_page(&title, &site_config.gallery.container_class, &images);
            println!("{}", page.into_string());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
