//! refdoc: generate reference documentation from type metadata and XML doc
//! comments.
//!
//! Two modes:
//!
//! - **stdout mode**: `refdoc -m meta.json -d docs.xml -t Acme.Widget`
//! - **file mode**: `refdoc -m meta.json -d 'xml/*.xml' -e snippets -o docs/api`

mod convert;
mod cref;
mod document;
mod links;
mod metadata;
mod page;
mod policy;
mod render;
mod snippets;
mod xmldoc;

use anyhow::{Context, Result};
use clap::Parser;
use metadata::{Metadata, TypeDescriptor};
use page::PageContext;
use snippets::{DirExamples, ExampleSource, NoExamples};
use std::fs;
use std::path::{Path, PathBuf};
use xmldoc::DocFile;

#[derive(Parser)]
#[command(
    name = "refdoc",
    about = "Generate Markdown reference documentation from type metadata and XML doc comments"
)]
struct Cli {
    /// Metadata dump (JSON) describing the types to document
    #[arg(short = 'm', long)]
    metadata: PathBuf,

    /// Documentation XML files (glob patterns supported). Later files
    /// override earlier ones for the same member.
    #[arg(short = 'd', long = "docs")]
    docs: Vec<String>,

    /// Output directory. If omitted, pages are written to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Language tag for code blocks
    #[arg(short = 'l', long, default_value = "csharp")]
    language: String,

    /// Directory of example snippets named after documentation ids
    #[arg(short = 'e', long)]
    examples: Option<PathBuf>,

    /// Render only this type (full path, e.g. Acme.Widget`1)
    #[arg(short = 't', long = "type")]
    type_path: Option<String>,

    /// Include internal and private types and members
    #[arg(long)]
    show_nonpublic: bool,

    /// Filter types by namespace. Prefix with ! to exclude.
    /// Can be specified multiple times. E.g. --filter '!Acme.Internal'
    #[arg(long)]
    filter: Vec<String>,

    /// Do not write the index page
    #[arg(long)]
    no_index: bool,

    /// More logging (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut metadata = load_metadata(&cli.metadata)?;
    policy::apply(&mut metadata, cli.show_nonpublic, &cli.filter);
    log::info!(
        "{} types to document from {}",
        metadata.types().len(),
        cli.metadata.display()
    );

    let docs = load_docs(&cli.docs)?;
    log::info!("{} documented members", docs.len());

    let examples: Box<dyn ExampleSource> = match &cli.examples {
        Some(dir) => Box::new(DirExamples::new(dir)),
        None => Box::new(NoExamples),
    };

    let renderer = render::create_renderer(&cli.format)?;
    let ctx = PageContext {
        metadata: &metadata,
        docs: &docs,
        examples: &*examples,
        language: &cli.language,
        extension: renderer.file_extension(),
    };
    let types = select_types(&metadata, cli.type_path.as_deref());

    match &cli.output {
        Some(dir) => file_mode(&cli, &ctx, renderer.as_ref(), &types, dir),
        None => stdout_mode(&ctx, renderer.as_ref(), &types),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_metadata(path: &Path) -> Result<Metadata> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Metadata::from_json(&content).with_context(|| format!("failed to load {}", path.display()))
}

/// Merge every documentation file; later files win.
fn load_docs(patterns: &[String]) -> Result<DocFile> {
    let mut docs = DocFile::default();
    for path in expand_globs(patterns)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        docs.merge(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
    }
    Ok(docs)
}

/// Expand glob patterns into a list of real file paths.
/// Order follows the patterns; matches of one pattern are sorted.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let mut matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            log::warn!("no files matched: {}", pattern);
        }
        matches.sort();
        files.extend(matches);
    }
    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

/// Types to render: the one named by `--type`, else all of them in path order.
fn select_types<'a>(metadata: &'a Metadata, type_path: Option<&str>) -> Vec<&'a TypeDescriptor> {
    match type_path {
        Some(path) => match metadata.find_type(path) {
            Some(ty) => vec![ty],
            None => {
                log::warn!("type not found: {}", path);
                Vec::new()
            }
        },
        None => {
            let mut types: Vec<&TypeDescriptor> = metadata.types().iter().collect();
            types.sort_by_key(|t| t.path());
            types
        }
    }
}

/// stdout mode: all selected pages as one document.
fn stdout_mode(
    ctx: &PageContext<'_>,
    renderer: &dyn render::Renderer,
    types: &[&TypeDescriptor],
) -> Result<()> {
    let mut doc = document::Document::new();
    for ty in types {
        doc.append_document(page::build_type_page(ctx, ty));
    }
    if doc.is_empty() {
        return Ok(());
    }
    print!("{}", renderer.render(&doc)?);
    Ok(())
}

/// file mode: one page per type plus the index, written to the output directory.
fn file_mode(
    cli: &Cli,
    ctx: &PageContext<'_>,
    renderer: &dyn render::Renderer,
    types: &[&TypeDescriptor],
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    let ext = renderer.file_extension();

    for ty in types {
        let doc = page::build_type_page(ctx, ty);
        let out_path = output_dir.join(format!("{}.{}", links::page_name(&ty.path()), ext));
        write_page(renderer, &doc, &out_path)?;
        log::info!("wrote {}", out_path.display());
    }

    if !cli.no_index && !types.is_empty() {
        let doc = page::build_index(ctx, types);
        write_page(renderer, &doc, &output_dir.join(format!("index.{}", ext)))?;
    }
    Ok(())
}

fn write_page(renderer: &dyn render::Renderer, doc: &document::Document, path: &Path) -> Result<()> {
    let output = renderer.render(doc)?;
    fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
}
