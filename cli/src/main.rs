//! blockweave CLI - redact, annotate and render content blocks

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use blockweave::{
    load_blocks, render, AccessibilityOptions, DecisionSet, DirectoryStore, JsonFormat,
    MarkdownOptions, PiiConfig, Redactor, RenderOptions, SuggestionEngine, Synthesizer, Theme,
    Weaver,
};

#[derive(Parser)]
#[command(name = "blockweave")]
#[command(version)]
#[command(about = "Redact, annotate and render document content blocks", long_about = None)]
struct Cli {
    /// Input blocks file (JSON array)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run redaction, suggestions and rendering, writing every output
    Run {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// PII categories to redact (comma separated, e.g. "email,phone")
        #[arg(long, value_delimiter = ',')]
        pii: Option<Vec<String>>,

        /// Page theme
        #[arg(long, value_enum, default_value = "light")]
        theme: ThemeArg,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Render every suggestion without review
        #[arg(long)]
        auto_approve: bool,

        /// Also save the document record into this directory store
        #[arg(long, value_name = "DIR", env = "BLOCKWEAVE_STORE")]
        store: Option<PathBuf>,
    },

    /// Redact PII from blocks
    Redact {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// PII categories to redact (comma separated)
        #[arg(long, value_delimiter = ',')]
        pii: Option<Vec<String>>,

        /// Minimum detection confidence
        #[arg(long)]
        threshold: Option<f32>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Suggest interactive components for blocks
    Suggest {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Render blocks to HTML
    #[command(alias = "html")]
    Render {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Decisions file (JSON object keyed by block id)
        #[arg(short, long, value_name = "FILE")]
        decisions: Option<PathBuf>,

        /// Render every suggestion without review
        #[arg(long, conflicts_with = "decisions")]
        auto_approve: bool,

        /// Page theme
        #[arg(long, value_enum, default_value = "light")]
        theme: ThemeArg,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Emit a fragment instead of a full document
        #[arg(long)]
        fragment: bool,

        /// Add accessibility enhancements and print a WCAG report
        #[arg(long)]
        accessible: bool,
    },

    /// Convert blocks to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Omit "---" between pages
        #[arg(long)]
        no_page_breaks: bool,

        /// Emit block id comments
        #[arg(long)]
        block_ids: bool,
    },

    /// Show block, PII and suggestion statistics
    Info {
        /// Input blocks file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ThemeArg {
    /// Light background (default)
    Light,
    /// Dark background
    Dark,
    /// Business report styling
    Professional,
    /// Serif paper styling
    Academic,
    /// Plain styling
    Minimal,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Professional => Theme::Professional,
            ThemeArg::Academic => Theme::Academic,
            ThemeArg::Minimal => Theme::Minimal,
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run {
            input,
            output,
            pii,
            theme,
            title,
            auto_approve,
            store,
        }) => {
            cmd_run(
                &input,
                output.as_deref(),
                pii.as_deref(),
                theme,
                title,
                auto_approve,
                store.as_deref(),
            )
            .await
        }
        Some(Commands::Redact {
            input,
            output,
            pii,
            threshold,
            compact,
        }) => cmd_redact(&input, output.as_deref(), pii.as_deref(), threshold, compact).await,
        Some(Commands::Suggest {
            input,
            output,
            compact,
        }) => cmd_suggest(&input, output.as_deref(), compact).await,
        Some(Commands::Render {
            input,
            output,
            decisions,
            auto_approve,
            theme,
            title,
            fragment,
            accessible,
        }) => {
            cmd_render(
                &input,
                output.as_deref(),
                decisions.as_deref(),
                auto_approve,
                theme,
                title,
                fragment,
                accessible,
            )
            .await
        }
        Some(Commands::Markdown {
            input,
            output,
            no_page_breaks,
            block_ids,
        }) => cmd_markdown(&input, output.as_deref(), no_page_breaks, block_ids),
        Some(Commands::Info { input }) => cmd_info(&input).await,
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_run(
                    &input,
                    cli.output.as_deref(),
                    None,
                    ThemeArg::Light,
                    None,
                    false,
                    None,
                )
                .await
            } else {
                println!("{}", "Usage: blockweave <FILE> [OUTPUT]".yellow());
                println!("       blockweave --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn pii_config(names: Option<&[String]>) -> Result<PiiConfig, blockweave::Error> {
    match names {
        Some(names) => PiiConfig::from_names(names),
        None => Ok(PiiConfig::default()),
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> CmdResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

async fn cmd_run(
    input: &Path,
    output: Option<&Path>,
    pii: Option<&[String]>,
    theme: ThemeArg,
    title: Option<String>,
    auto_approve: bool,
    store: Option<&Path>,
) -> CmdResult {
    let stem = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(format!("{}_output", stem)));

    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading blocks...");
    let blocks = load_blocks(input)?;
    pb.inc(1);

    let mut weaver = Weaver::new()
        .with_pii(pii_config(pii)?)
        .with_theme(theme.into())
        .auto_approve(auto_approve);
    if let Some(title) = title {
        weaver = weaver.with_title(title);
    }
    if let Some(dir) = store {
        weaver = weaver.with_store(Arc::new(DirectoryStore::open(dir)?));
    }
    let pipeline = weaver.build();

    pb.set_message("Redacting and annotating...");
    let mut doc = pipeline.process(&stem, blocks, None).await?;
    pb.inc(1);

    pb.set_message("Rendering...");
    let synthesis = pipeline.render(&mut doc)?;
    if let Some(store) = pipeline.store() {
        store.save(&doc)?;
    }
    pb.inc(1);

    pb.set_message("Writing outputs...");
    fs::write(output_dir.join("page.html"), &synthesis.html)?;
    fs::write(
        output_dir.join("page.md"),
        render::to_markdown(&doc.blocks, &MarkdownOptions::default()),
    )?;
    fs::write(
        output_dir.join("suggestions.json"),
        render::to_json(&doc.suggestions, JsonFormat::Pretty)?,
    )?;
    fs::write(
        output_dir.join("document.json"),
        render::to_json(&doc, JsonFormat::Pretty)?,
    )?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    println!("  {} page.html", "├─".dimmed());
    println!("  {} page.md", "├─".dimmed());
    println!("  {} suggestions.json", "├─".dimmed());
    println!("  {} document.json", "└─".dimmed());

    println!(
        "\n{} redactions, {} suggestions, {} interactive blocks",
        doc.ledger.records().len(),
        doc.suggestions.len(),
        synthesis.stats.interactive_count()
    );
    if synthesis.stats.fallback_count > 0 {
        println!(
            "{} {} blocks fell back to plain markup",
            "Warning:".yellow(),
            synthesis.stats.fallback_count
        );
    }

    Ok(())
}

async fn cmd_redact(
    input: &Path,
    output: Option<&Path>,
    pii: Option<&[String]>,
    threshold: Option<f32>,
    compact: bool,
) -> CmdResult {
    let blocks = load_blocks(input)?;

    let mut config = pii_config(pii)?;
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold);
    }

    let redaction = Redactor::new()
        .with_pattern_backend()
        .redact(&blocks, &config)
        .await?;

    let json = render::to_json(&redaction, json_format(compact))?;
    write_or_print(output, &json)
}

async fn cmd_suggest(input: &Path, output: Option<&Path>, compact: bool) -> CmdResult {
    let blocks = load_blocks(input)?;
    let suggestions = SuggestionEngine::new().suggest(&blocks, None).await;

    let json = render::to_json(&suggestions, json_format(compact))?;
    write_or_print(output, &json)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_render(
    input: &Path,
    output: Option<&Path>,
    decisions: Option<&Path>,
    auto_approve: bool,
    theme: ThemeArg,
    title: Option<String>,
    fragment: bool,
    accessible: bool,
) -> CmdResult {
    let blocks = load_blocks(input)?;
    let suggestions = SuggestionEngine::new().suggest(&blocks, None).await;

    let decisions = match decisions {
        Some(path) => serde_json::from_str::<DecisionSet>(&fs::read_to_string(path)?)?,
        None if auto_approve => DecisionSet::new().approve_all(&suggestions),
        None => DecisionSet::new(),
    };

    let mut options = RenderOptions::new().with_theme(theme.into());
    if let Some(title) = title {
        options = options.with_title(title);
    }
    if fragment {
        options = options.fragment();
    }
    if accessible {
        options = options.with_accessibility(AccessibilityOptions::new());
    }

    let result = Synthesizer::with_options(options).synthesize(&blocks, &suggestions, &decisions)?;
    for block in result.blocks.iter().filter(|b| b.fallback.is_some()) {
        eprintln!(
            "{} block {} rendered as plain markup",
            "Warning:".yellow(),
            block.block_id
        );
    }
    if let Some(report) = &result.accessibility {
        let verdict = if report.passed {
            "passed".green()
        } else {
            "failed".red()
        };
        eprintln!(
            "{} WCAG {} {} (score {}, {} errors, {} warnings)",
            "Accessibility:".cyan(),
            report.wcag_level,
            verdict,
            report.score,
            report.summary.errors,
            report.summary.warnings
        );
        for issue in &report.issues {
            eprintln!("  [{}] {}", issue.rule_id, issue.message);
        }
    }

    write_or_print(output, &result.html)
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    no_page_breaks: bool,
    block_ids: bool,
) -> CmdResult {
    let blocks = load_blocks(input)?;

    let options = MarkdownOptions::new()
        .with_page_separators(!no_page_breaks)
        .with_block_ids(block_ids);
    let markdown = render::to_markdown(&blocks, &options);

    write_or_print(output, &markdown)
}

async fn cmd_info(input: &Path) -> CmdResult {
    let blocks = load_blocks(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let pages: std::collections::BTreeSet<u32> = blocks.iter().map(|b| b.page).collect();
    let words: usize = blocks.iter().map(|b| b.text.split_whitespace().count()).sum();

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Blocks".bold(), blocks.len());
    println!("{}: {}", "Pages".bold(), pages.len());
    println!("{}: {}", "Words".bold(), words);

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for block in &blocks {
        *kinds.entry(block.kind.as_str()).or_default() += 1;
    }
    for (kind, count) in &kinds {
        println!("  {} {}: {}", "·".dimmed(), kind, count);
    }

    println!();
    println!("{}", "Sensitive Content".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let redaction = Redactor::new()
        .with_pattern_backend()
        .redact(&blocks, &PiiConfig::default())
        .await?;
    let summary = redaction.ledger().summary();
    if summary.is_empty() {
        println!("{}", "No PII found".green());
    }
    for (tag, totals) in &summary {
        println!(
            "{}: {} (avg confidence {:.2})",
            tag.bold(),
            totals.count,
            totals.average_confidence
        );
    }

    println!();
    println!("{}", "Suggestions".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let suggestions = SuggestionEngine::new().suggest(&redaction.blocks, None).await;
    if suggestions.is_empty() {
        println!("{}", "None".dimmed());
    }
    for suggestion in &suggestions {
        println!(
            "{}: {} ({:.2}, {:?})",
            suggestion.block_id.bold(),
            suggestion.kind,
            suggestion.confidence,
            suggestion.source
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "blockweave".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Content block redaction, suggestion and synthesis tool");
    println!();
    println!("Themes: {}", Theme::ALL.map(|t| t.as_str()).join(", ").dimmed());
}
