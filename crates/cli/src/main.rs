use anyhow::Context;
use clap::Parser;
use dirtree_core::human::human_bytes;
use dirtree_core::TreeBuilder;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dirtree", about = "Directory tree builder and file lister")]
struct Args {
    /// Root directory to walk
    root: PathBuf,
    /// Only list files with this extension, dot included (e.g. `.go`)
    #[arg(short, long, default_value = "")]
    ext: String,
    /// Write the nested tree as JSON to this path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Write a flat CSV listing to this path
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Descend into symlinked directories
    #[arg(long)]
    follow_links: bool,
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let tree = TreeBuilder::new(&args.root)
        .follow_links(args.follow_links)
        .build()
        .with_context(|| format!("building tree for {}", args.root.display()))?;

    if let Some(path) = &args.json {
        let json = dirtree_core::export::to_json(&tree)?;
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote json");
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        dirtree_core::export::to_csv(&tree, std::io::BufWriter::new(file))?;
        tracing::info!(path = %path.display(), "wrote csv");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for node in tree.files(tree.root(), &args.ext) {
        writeln!(out, "{}", node.path.display())?;
    }

    let stats = tree.stats(tree.root());
    eprintln!(
        "{} files, {} dirs, {}",
        stats.files,
        stats.dirs,
        human_bytes(stats.bytes)
    );
    Ok(())
}
