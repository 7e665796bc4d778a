//! sitedata CLI
//!
//! Command-line tool for loading site CSV data and injecting page dependencies.
//!
//! Set `RUST_LOG=debug` for pipeline logging.

use clap::{Parser, Subcommand, ValueEnum};
use sitedata_core::{
    inject_file, load_csv, load_dir, load_table, scan_directory, DuplicatePolicy, LoadOptions,
    Shape,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitedata")]
#[command(about = "Static-site data loader and page dependency injector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file and print it as JSON
    Load {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        options: OptionArgs,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a CSV file and display it as a table
    Show {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Columns to display (comma-separated)
        #[arg(short, long)]
        columns: Option<String>,
    },

    /// Load every CSV file under the roots into one JSON object keyed by file stem
    LoadDir {
        /// Root directories to scan
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add script and stylesheet tags for declared dependencies to HTML pages
    Inject {
        /// Root directories to scan for .html pages
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,

        /// Write pages here instead of rewriting them in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a load options file
    CreateConfig {
        /// Output path for the options file
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only rows, types, range and colnum
        #[arg(long)]
        summary: bool,

        /// How to handle repeated column names
        #[arg(long, value_enum)]
        duplicates: Option<DuplicatesArg>,
    },
}

#[derive(clap::Args)]
struct OptionArgs {
    /// Load options file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep only rows, types, range and colnum
    #[arg(long)]
    summary: bool,

    /// How to handle repeated column names
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatesArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplicatesArg {
    LastWins,
    Error,
    Suffix,
}

impl From<DuplicatesArg> for DuplicatePolicy {
    fn from(arg: DuplicatesArg) -> Self {
        match arg {
            DuplicatesArg::LastWins => DuplicatePolicy::LastWins,
            DuplicatesArg::Error => DuplicatePolicy::Error,
            DuplicatesArg::Suffix => DuplicatePolicy::Suffix,
        }
    }
}

impl OptionArgs {
    /// Options file first, then flags on top
    fn resolve(&self) -> sitedata_core::Result<LoadOptions> {
        let mut options = match &self.config {
            Some(path) => LoadOptions::load(path)?,
            None => LoadOptions::new(),
        };
        if self.summary {
            options.shape = Shape::Summary;
        }
        if let Some(duplicates) = self.duplicates {
            options.duplicates = duplicates.into();
        }
        Ok(options)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> sitedata_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            file,
            options,
            output,
        } => cmd_load(&file, &options.resolve()?, output.as_deref()),
        Commands::Show {
            file,
            limit,
            columns,
        } => cmd_show(&file, limit, columns),
        Commands::LoadDir {
            root,
            options,
            output,
        } => cmd_load_dir(&root, &options.resolve()?, output.as_deref()),
        Commands::Inject { root, output } => cmd_inject(&root, output.as_deref()),
        Commands::CreateConfig {
            output,
            summary,
            duplicates,
        } => cmd_create_config(&output, summary, duplicates),
    }
}

/// Write pretty JSON to a file, or stdout when no path is given
fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> sitedata_core::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_load(file: &Path, options: &LoadOptions, output: Option<&Path>) -> sitedata_core::Result<()> {
    let table = load_csv(file, options)?;
    info!(path = %file.display(), rows = table.rows().len(), "loaded table");
    write_json(&table, output)
}

fn cmd_show(file: &Path, limit: Option<usize>, columns: Option<String>) -> sitedata_core::Result<()> {
    let table = load_table(file, DuplicatePolicy::LastWins)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    // Filter columns if specified
    let col_filter: Option<Vec<&str>> = columns.as_ref().map(|c| c.split(',').collect());

    let display_cols: Vec<usize> = (0..table.column_count())
        .filter(|&j| {
            col_filter
                .as_ref()
                .map_or(true, |filter| filter.contains(&table.names[j].as_str()))
        })
        .collect();

    // Print header
    let header: Vec<String> = display_cols
        .iter()
        .map(|&j| format!("{} ({})", table.names[j], table.types[j]))
        .collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    // Print rows
    let row_limit = limit.unwrap_or(10);
    for row in table.data.iter().take(row_limit) {
        let values: Vec<String> = display_cols.iter().map(|&j| row[j].to_string()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > row_limit {
        println!("... ({} more rows)", table.row_count() - row_limit);
    }

    // Print ranges of numeric columns
    let ranges: Vec<String> = display_cols
        .iter()
        .filter_map(|&j| {
            let name = &table.names[j];
            table
                .range
                .get(name)
                .map(|r| format!("  {}: {} .. {}", name, r.min, r.max))
        })
        .collect();
    if !ranges.is_empty() {
        println!();
        println!("Ranges:");
        for line in ranges {
            println!("{}", line);
        }
    }

    Ok(())
}

fn cmd_load_dir(
    roots: &[PathBuf],
    options: &LoadOptions,
    output: Option<&Path>,
) -> sitedata_core::Result<()> {
    let tables = load_dir(roots, options)?;
    info!(tables = tables.len(), "loaded data directory");
    write_json(&tables, output)
}

fn cmd_inject(roots: &[PathBuf], output_dir: Option<&Path>) -> sitedata_core::Result<()> {
    let mut pages = 0;
    let mut total = 0;

    for root in roots {
        for page in scan_directory(&[root], "html")? {
            let target = match output_dir {
                Some(dir) => dir.join(page.strip_prefix(root).unwrap_or(page.as_path())),
                None => page.clone(),
            };
            let injected = inject_file(&page, &target)?;
            if injected > 0 {
                println!("  {} (+{})", target.display(), injected);
            }
            pages += 1;
            total += injected;
        }
    }

    println!("Processed {} pages, injected {} dependencies", pages, total);

    Ok(())
}

fn cmd_create_config(
    output: &Path,
    summary: bool,
    duplicates: Option<DuplicatesArg>,
) -> sitedata_core::Result<()> {
    let mut options = LoadOptions::new();
    if summary {
        options.shape = Shape::Summary;
    }
    if let Some(duplicates) = duplicates {
        options.duplicates = duplicates.into();
    }

    options.save(output)?;
    println!("Created options file: {}", output.display());
    println!();
    println!("Use it with:");
    println!("  sitedata load --file <csv> --config {}", output.display());

    Ok(())
}
