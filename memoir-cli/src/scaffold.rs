//! Scratch-project scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use memoir_cache::DEFAULT_JSON_CACHE_FILE;
use tracing::{info, warn};

/// Arguments for `memoir new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Package name for the generated project.
    #[arg(default_value = "memoir-app")]
    pub name: String,

    /// Create the project here instead of a fresh temp directory.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Open $EDITOR (or `code`) in the project directory when done.
    #[arg(long)]
    pub edit: bool,
}

/// Where the scaffold landed.
pub struct ScaffoldOutcome {
    pub project_dir: PathBuf,
}

/// Create the project directory and write the starter file set.
pub fn scaffold(args: &NewArgs) -> anyhow::Result<ScaffoldOutcome> {
    let project_dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::temp_dir().join(format!(
            "memoir-{}",
            chrono::Utc::now().timestamp_millis()
        )),
    };

    fs::create_dir_all(project_dir.join("src"))
        .with_context(|| format!("creating {}", project_dir.display()))?;
    info!(dir = %project_dir.display(), "created project directory");

    fs::write(
        project_dir.join("Cargo.toml"),
        starter_manifest(&args.name),
    )
    .context("writing Cargo.toml")?;
    fs::write(project_dir.join("src").join("main.rs"), STARTER_MAIN)
        .context("writing src/main.rs")?;
    fs::write(project_dir.join(DEFAULT_JSON_CACHE_FILE), "{}\n")
        .context("writing empty cache document")?;

    copy_home_dotfile(&project_dir);

    Ok(ScaffoldOutcome { project_dir })
}

/// Copy `~/.memoir` into the project's `.env` when the dotfile exists.
/// Failure to copy is diagnostic only, the scaffold still succeeds.
fn copy_home_dotfile(project_dir: &Path) {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let dotfile = home.join(".memoir");
    if !dotfile.exists() {
        return;
    }
    match fs::copy(&dotfile, project_dir.join(".env")) {
        Ok(_) => info!("copied ~/.memoir configuration to .env"),
        Err(e) => warn!(error = %e, "could not copy ~/.memoir configuration"),
    }
}

/// Spawn the user's editor in the project directory.
pub fn open_editor(project_dir: &Path) -> anyhow::Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "code".to_string());
    let status = std::process::Command::new(&editor)
        .arg(".")
        .current_dir(project_dir)
        .status()
        .with_context(|| format!("spawning editor {editor:?}"))?;
    if !status.success() {
        warn!(%editor, %status, "editor exited with failure");
    }
    Ok(())
}

/// Print the follow-up commands for the freshly scaffolded project.
pub fn print_next_steps(outcome: &ScaffoldOutcome) {
    println!("Setup complete! Your new memoir project is ready.");
    println!();
    println!("    cd {}", outcome.project_dir.display());
    println!("    cargo run");
    println!();
    println!("Results of the memoized calls land in cache.db; bump a key's");
    println!("version tag to invalidate them.");
}

fn starter_manifest(name: &str) -> String {
    format!(
        r#"[package]
name = "{name}"
version = "0.1.0"
edition = "2021"

[dependencies]
memoir-cache = "0.1"
tokio = {{ version = "1", features = ["full"] }}
anyhow = "1"
reqwest = "0.12"
serde = {{ version = "1", features = ["derive"] }}
serde_json = "1"
"#
    )
}

/// Starter program: a memoized page load feeding a memoized extraction
/// step, both persisted across runs.
const STARTER_MAIN: &str = r#"use std::sync::Arc;

use memoir_cache::{BoxError, CacheStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open("cache.db")?);

    // Expensive page load, memoized under loadHTML:0. Bump the version
    // tag to invalidate previous results.
    let load_html = Arc::clone(&store).wrap(
        "loadHTML",
        |(url,): (String,)| async move {
            let body = reqwest::get(&url).await?.text().await?;
            Ok::<_, BoxError>(body)
        },
        Some("0"),
    )?;

    let html: String = load_html
        .call(("https://example.com".to_string(),))
        .await?;

    // Extraction step (swap in an LLM call here), memoized independently
    // per input under getPageTitle:0.
    let page_title = store.wrap(
        "getPageTitle",
        |(html,): (String,)| async move {
            let title = html
                .split("<title>")
                .nth(1)
                .and_then(|rest| rest.split("</title>").next())
                .unwrap_or("(no title)")
                .trim()
                .to_string();
            Ok::<_, BoxError>(title)
        },
        Some("0"),
    )?;

    let title: String = page_title.call((html,)).await?;
    println!("{title}");
    Ok(())
}
"#;
