use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use postgraph::config::{Layout, Overrides, Settings, TagStyle};
use postgraph::error::BuildError;
use postgraph::pipeline;
use tracing::error;

/// Build the posts graph artifact from a tree of markdown files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Project root holding the posts directory and the artifact
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Posts directory, relative to the project root
    #[arg(long)]
    posts: Option<String>,

    /// Artifact path, relative to the project root
    #[arg(long)]
    output: Option<String>,

    /// Also link `[[Target]]` wiki references
    #[arg(long)]
    wiki_links: bool,

    /// Accept `word#tag`, rejecting only tags after `#`, `&`, `(` or `[`
    #[arg(long)]
    guarded_tags: bool,

    /// Write the artifact without indentation
    #[arg(long)]
    compact: bool,

    /// Log every rewritten reference
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<BuildError>() {
            Some(build_err) if build_err.is_missing_input() && std::io::stderr().is_terminal() => {
                eprintln!("{build_err}");
                eprintln!("hint: create it or pass --posts <DIR> relative to the project root");
                ExitCode::SUCCESS
            }
            _ => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("resolving project root {}", cli.root.display()))?;

    let overrides = Overrides {
        posts_dir: cli.posts.clone(),
        output_file: cli.output.clone(),
        wiki_links: cli.wiki_links.then_some(true),
        tag_style: cli.guarded_tags.then_some(TagStyle::Guarded),
        pretty: cli.compact.then_some(false),
    };
    let settings = Settings::new(&root, &overrides).context("loading settings")?;
    let layout = Layout::new(&root, &settings);

    pipeline::run(&settings, &layout)?;
    Ok(())
}
