//! Marlin CLI
//!
//! A headless document loader for testing and debugging: parses a page,
//! optionally runs its scripts, and dumps tokens, the DOM tree, or a
//! JSON snapshot.

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use marlin_browser::{NoopExecutor, Page, ScriptExecutor};
use marlin_common::net::HttpResourceProvider;
use marlin_dom::NodeId;
use marlin_html::{Tokenizer, print_tree};
use marlin_js::BoaExecutor;
use owo_colors::OwoColorize;
use std::fs;
use std::sync::Arc;

/// Load an HTML document headlessly and inspect the result.
#[derive(Debug, Parser)]
#[command(name = "marlin", version, about)]
struct Args {
    /// File path or http(s):// URL to load.
    input: Option<String>,

    /// Parse this HTML string instead of reading a file or URL.
    #[arg(long, conflicts_with = "input")]
    html: Option<String>,

    /// Print the token stream before the tree.
    #[arg(long)]
    tokens: bool,

    /// Print the DOM tree (default when no other output is selected).
    #[arg(long)]
    tree: bool,

    /// Print a JSON snapshot of the document.
    #[arg(long)]
    json: bool,

    /// Execute scripts with the Boa runtime instead of skipping them.
    #[arg(long)]
    run_scripts: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let executor: Box<dyn ScriptExecutor> = if args.run_scripts {
        Box::new(BoaExecutor::spawn())
    } else {
        Box::new(NoopExecutor::new())
    };
    let page = Page::new(Arc::new(HttpResourceProvider::new()), executor);

    let source = match (&args.html, &args.input) {
        (Some(html), _) => {
            page.write(html);
            html.clone()
        }
        (None, Some(input)) if input.starts_with("http://") || input.starts_with("https://") => {
            page.load_url(input)
                .with_context(|| format!("failed to load '{input}'"))?;
            // Re-fetch only for the token dump; the page already parsed it.
            String::new()
        }
        (None, Some(input)) => {
            let html = fs::read_to_string(input)
                .with_context(|| format!("failed to read '{input}'"))?;
            page.write(&html);
            html
        }
        (None, None) => bail!("provide a file path, a URL, or --html '<p>...</p>'"),
    };

    if args.tokens {
        println!("{}", "=== Tokens ===".cyan().bold());
        if source.is_empty() {
            println!("(token dump is only available for local and --html input)");
        } else {
            for token in Tokenizer::new(&source) {
                println!("{token}");
            }
        }
        println!();
    }

    if args.json {
        println!("{}", "=== Snapshot ===".cyan().bold());
        let rendered = serde_json::to_string_pretty(&page.snapshot())
            .context("failed to serialize the document snapshot")?;
        println!("{rendered}");
        println!();
    }

    if args.tree || !(args.tokens || args.json) {
        println!("{}", "=== DOM Tree ===".cyan().bold());
        page.with_document(|doc| print_tree(doc, NodeId::ROOT, 0));
        println!();
    }

    println!(
        "{} readyState: {}",
        "done.".green(),
        page.ready_state()
    );
    Ok(())
}
