use anyhow::{Context, Result};
use canopy::data::{index_issues, load_issues, SortDirection, SortField};
use canopy::tree::TreeModel;
use canopy::{config, tui};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(about = "Hierarchical issue tree for beads issue trackers")]
#[command(version)]
struct Args {
    /// Write the default configuration and exit
    #[arg(long)]
    init: bool,

    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Beads directory holding issues.jsonl (overrides BEADS_DIR and config)
    #[arg(long)]
    beads_dir: Option<PathBuf>,

    /// Render the tree once to stdout and exit
    #[arg(long)]
    print: bool,

    /// Filter: all, open, closed, ready, or an advanced query like "type:epic !status:closed"
    #[arg(long)]
    filter: Option<String>,

    /// Sort field, optionally with a direction: "priority", "title:asc"
    #[arg(long)]
    sort: Option<String>,

    /// Start in flat mode
    #[arg(long)]
    flat: bool,

    /// Start with follow mode on
    #[arg(long)]
    follow: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(!args.print && !args.init)?;

    if args.init {
        let path = config::init(args.config.as_deref())?;
        println!("Config saved to {}", path.display());
        return Ok(());
    }

    let mut config = config::load(args.config.as_deref())?;
    let env_dir = std::env::var(config::BEADS_DIR_ENV).ok();
    config.beads.dir = config::resolve_beads_dir(args.beads_dir.as_deref(), env_dir.as_deref(), &config);

    let mut model = TreeModel::new();
    model.set_beads_dir(config.beads.dir.clone());

    let (field, direction) = match args.sort.as_deref() {
        Some(spec) => parse_sort(spec)?,
        None => config.tree.sort(),
    };
    model.set_sort(field, direction);

    let filter = args.filter.unwrap_or_else(|| config.tree.filter.clone());
    apply_filter(&mut model, &filter);

    if args.flat {
        model.toggle_flat_mode();
    }
    if args.follow {
        model.toggle_follow_mode();
    }

    let issues_path = config.beads.issues_path();

    if args.print {
        let issues = load_issues(&issues_path)?;
        model.set_global_issue_index(Arc::new(index_issues(&issues)));
        model.build(&issues);
        model.set_size(config.ui.width, config.ui.height);
        println!("{}", model.view());
        return Ok(());
    }

    let mut app = tui::App::new(model, issues_path);
    app.reload()?;
    tui::run(app, &config.watch)
}

/// Simple filter names go to the simple engine, anything else is a query.
fn apply_filter(model: &mut TreeModel, filter: &str) {
    let simple = ["all", "open", "closed", "ready"];
    if simple.contains(&filter.trim().to_ascii_lowercase().as_str()) {
        model.apply_filter(filter);
    } else {
        model.apply_advanced_filter(filter);
    }
}

/// `field` or `field:direction`.
fn parse_sort(spec: &str) -> Result<(SortField, SortDirection)> {
    let (field, direction) = match spec.split_once(':') {
        Some((field, direction)) => (field, Some(direction)),
        None => (spec, None),
    };
    let field: SortField = field.parse()?;
    let direction = match direction {
        Some(d) => d.parse()?,
        None => field.default_direction(),
    };
    Ok((field, direction))
}

/// Log to stderr for one-shot commands and to a file while the TUI owns the
/// terminal.
fn init_logging(interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive("canopy=info".parse()?);

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let dir = config::data_dir()?;
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join("canopy.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
