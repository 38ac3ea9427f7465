use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::catalog::{self, SearchHit};
use crate::config::CatalogParams;
use crate::error::Result;
use crate::logging;
use crate::schema;
use crate::workbook::Workbook;

#[derive(Debug, Parser)]
#[command(
    name = "chess-meta",
    version,
    about = "Metadata schema generation and catalog tools"
)]
pub struct Cli {
    /// Debug logging on stderr (CHESS_META_LOG overrides).
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Convert a site's schema sheet into a JSON schema document.
    Schema {
        /// Workbook file (.xlsx, .xls, .ods) or a directory of CSV sheets.
        workbook: PathBuf,
        /// Site name as used in the `<SITE>_schema` sheet, e.g. ID1A3.
        site: String,
        /// Output name without extension; defaults to the site name.
        output: Option<String>,
        /// Emit a flat `{ key: null }` template instead of descriptors.
        #[arg(long)]
        keys_only: bool,
    },
    /// Print sheet names and the first rows of each sheet.
    Inspect {
        workbook: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long, default_value_t = 25)]
        rows: usize,
    },
    /// Create the files database tables.
    InitDb {
        #[arg(long)]
        params: PathBuf,
    },
    /// Insert a document's text and its dataset's files.
    Ingest {
        #[arg(long)]
        params: PathBuf,
    },
    /// Free-text search over stored metadata.
    Find {
        #[arg(long)]
        params: PathBuf,
        #[arg(long)]
        query: String,
        /// Also list the files associated with each match.
        #[arg(long)]
        list_files: bool,
        #[arg(long)]
        json: bool,
    },
    /// List the files registered for a dataset.
    Files {
        #[arg(long)]
        params: PathBuf,
        /// Dataset as /experiment/processing/tier.
        dataset: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::Inspect { .. } => "inspect",
            Self::InitDb { .. } => "init-db",
            Self::Ingest { .. } => "ingest",
            Self::Find { .. } => "find",
            Self::Files { .. } => "files",
        }
    }
}

pub fn parse_command(args: &[String]) -> std::result::Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

/// Exit code: 0 success, 1 failed operation, 2 usage error.
pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match parse_command(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 2 } else { 0 };
            let _ = err.print();
            return code;
        }
    };
    logging::init(cli.verbose);

    let name = cli.command.name();
    let outcome = match cli.command {
        Command::Schema {
            workbook,
            site,
            output,
            keys_only,
        } => handle_schema(&workbook, &site, output.as_deref(), keys_only),
        Command::Inspect {
            workbook,
            sheet,
            rows,
        } => handle_inspect(&workbook, sheet.as_deref(), rows),
        Command::InitDb { params } => handle_init_db(&params),
        Command::Ingest { params } => handle_ingest(&params),
        Command::Find {
            params,
            query,
            list_files,
            json,
        } => handle_find(&params, &query, list_files, json),
        Command::Files { params, dataset } => handle_files(&params, &dataset),
    };

    match outcome {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{name} failed: {err}");
            1
        }
    }
}

fn handle_schema(workbook: &Path, site: &str, output: Option<&str>, keys_only: bool) -> Result<()> {
    let mut workbook = Workbook::open(workbook)?;
    let document = if keys_only {
        schema::generate_key_template(&mut workbook, site)?
    } else {
        schema::generate_schema(&mut workbook, site)?
    };
    let path = schema::output_path(output, site);
    let rendered = schema::write_json(&path, &document)?;
    println!("{rendered}");
    Ok(())
}

fn handle_inspect(workbook: &Path, sheet: Option<&str>, rows: usize) -> Result<()> {
    let mut workbook = Workbook::open(workbook)?;
    let names = workbook.sheet_names()?;
    println!("Workbook: {}", workbook.path().display());
    println!("Sheets ({}): {}", names.len(), names.join(", "));

    let selected: Vec<String> = match sheet {
        Some(name) => vec![name.to_string()],
        None => names,
    };
    for name in selected {
        let table = workbook.sheet(&name)?;
        println!(
            "\nSheet: {name}\nSize: {} rows x {} cols\nFirst {} rows:",
            table.rows().len() + 1,
            table.width(),
            rows
        );
        println!("  0: {}", table.headers().join(" | "));
        for (i, row) in table.rows().iter().take(rows.saturating_sub(1)).enumerate() {
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
            println!("  {}: {}", i + 1, cells.join(" | "));
        }
    }
    Ok(())
}

fn handle_init_db(params: &Path) -> Result<()> {
    let params = CatalogParams::load(params)?;
    catalog::init_db(&params)?;
    println!("files database ready: {}", params.get("filesdb")?);
    Ok(())
}

fn handle_ingest(params: &Path) -> Result<()> {
    let params = CatalogParams::load(params)?;
    match catalog::ingest(&params)? {
        Some(report) => println!(
            "ingest complete: dataset={} did={} files={} meta_id={}",
            report.dataset, report.did, report.file_count, report.meta_id
        ),
        None => println!("ingest skipped: document has no text"),
    }
    Ok(())
}

fn handle_find(params: &Path, query: &str, list_files: bool, json: bool) -> Result<()> {
    let params = CatalogParams::load(params)?;
    let hits = catalog::find(&params, query, list_files)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_hits(&hits);
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    for hit in hits {
        println!("{}", hit.meta);
        if let Some(files) = &hit.files {
            println!("Associated dataset {}", hit.dataset);
            println!("Associated files:");
            for name in files {
                println!("{name}");
            }
        }
    }
}

fn handle_files(params: &Path, dataset: &str) -> Result<()> {
    let params = CatalogParams::load(params)?;
    for name in catalog::dataset_files(&params, dataset)? {
        println!("{name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_schema_with_optional_output() {
        let cli = parse_command(&args(&["chess-meta", "schema", "book.xlsx", "ID1A3"]))
            .expect("parse");
        assert_eq!(
            cli.command,
            Command::Schema {
                workbook: PathBuf::from("book.xlsx"),
                site: "ID1A3".to_string(),
                output: None,
                keys_only: false,
            }
        );

        let cli = parse_command(&args(&[
            "chess-meta", "--verbose", "schema", "book.xlsx", "ID1A3", "out", "--keys-only",
        ]))
        .expect("parse");
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Schema { ref output, keys_only: true, .. } if output.as_deref() == Some("out")
        ));
    }

    #[test]
    fn find_flags_and_usage_errors() {
        let cli = parse_command(&args(&[
            "chess-meta", "find", "--params", "p.json", "--query", "silicon", "--list-files",
        ]))
        .expect("parse");
        assert!(matches!(cli.command, Command::Find { list_files: true, json: false, .. }));

        assert_eq!(run_with_args(&args(&["chess-meta"])), 2);
        assert_eq!(run_with_args(&args(&["chess-meta", "bogus"])), 2);
    }
}
