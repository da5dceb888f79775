use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use psd_template::{
    Directive, FontLibrary, LoadOpts, RenderOpts, Replacements, TemplateRenderer,
    flatten_layers_with_depth, load_document_from_path, match_directive,
};

#[derive(Parser, Debug)]
#[command(name = "psd-template", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill `{{KEY}}` text layers and write the composite as a PNG.
    Render(RenderArgs),
    /// Print the `[NAME]` region map as JSON.
    Regions(RegionsArgs),
    /// Print the layer tree with kinds, bounds and directives.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input layered document.
    #[arg(long)]
    psd: PathBuf,

    /// Background image (any format the image decoder supports).
    #[arg(long)]
    background: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Replacement as KEY=VALUE. Repeatable; wins over `--values`.
    #[arg(long = "set", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// JSON object of replacements.
    #[arg(long)]
    values: Option<PathBuf>,

    /// Directory of .ttf/.otf/.ttc files to register.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// JSON render options.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RegionsArgs {
    /// Input layered document.
    #[arg(long)]
    psd: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input layered document.
    #[arg(long)]
    psd: PathBuf,

    /// Also decode pixel data and report which layers carry a raster.
    #[arg(long)]
    pixels: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Regions(args) => cmd_regions(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.to_string(), v.to_string()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {what} JSON '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let opts: RenderOpts = match &args.config {
        Some(p) => read_json(p, "render options")?,
        None => RenderOpts::default(),
    };

    let mut replacements: Replacements = match &args.values {
        Some(p) => read_json(p, "replacement values")?,
        None => Replacements::new(),
    };
    replacements.extend(args.set);

    let fonts = match &args.fonts {
        Some(dir) => FontLibrary::from_dir(dir)?,
        None => FontLibrary::new(),
    }
    .with_default_family(opts.style.font_family.clone());
    if fonts.is_empty() {
        eprintln!("warning: no fonts registered; text layers will render blank (use --fonts)");
    }

    let renderer = TemplateRenderer::new(fonts).with_opts(opts);
    let png = renderer.render_to_file(&args.psd, &args.background, &args.out, &replacements)?;
    eprintln!("wrote {} ({} bytes)", args.out.display(), png.len());
    Ok(())
}

fn cmd_regions(args: RegionsArgs) -> anyhow::Result<()> {
    let regions = psd_template::extract_regions(&args.psd)?;
    println!("{}", serde_json::to_string_pretty(&regions)?);
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let opts = if args.pixels {
        LoadOpts::default()
    } else {
        LoadOpts::metadata_only()
    };
    let doc = load_document_from_path(&args.psd, opts)?;
    println!(
        "{}x{} {:?} depth={} mode={}",
        doc.width(),
        doc.height(),
        doc.version,
        doc.depth,
        doc.color_mode
    );
    if args.pixels {
        println!(
            "composite={} thumbnail={}",
            doc.composite.is_some(),
            doc.thumbnail.is_some()
        );
    }

    for (depth, layer) in flatten_layers_with_depth(&doc) {
        let b = layer.bounds;
        let directive = match match_directive(&layer.name) {
            Directive::Substitute(key) if layer.is_text() => format!(" sub={key}"),
            Directive::Substitute(_) | Directive::None => String::new(),
            Directive::Region(name) => format!(" region={name}"),
        };
        let hidden = if layer.visible { "" } else { " hidden" };
        let raster = if args.pixels && layer.raster.is_some() {
            " raster"
        } else {
            ""
        };
        println!(
            "{:indent$}{} [{}] ({},{})-({},{}){directive}{hidden}{raster}",
            "",
            layer.name,
            layer.kind_name(),
            b.left,
            b.top,
            b.right,
            b.bottom,
            indent = depth * 2
        );
        if let Some(text) = layer.text() {
            println!("{:indent$}  text: {:?}", "", text.text, indent = depth * 2);
        }
    }
    Ok(())
}
