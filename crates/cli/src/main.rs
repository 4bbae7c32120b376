//! CLI tool for dumping cell text from legacy XLS files.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use xls_biff::{SheetVisibility, Workbook};

/// Dump the cell text of legacy Excel (.xls) workbooks.
#[derive(Parser, Debug)]
#[command(name = "xls-dump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Excel file(s) (.xls, BIFF5 or BIFF8)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of rows to dump per file, across sheets
    #[arg(short = 'n', long)]
    max_rows: Option<usize>,

    /// Only dump the sheet with this name
    #[arg(short, long)]
    sheet: Option<String>,

    /// Print rows of all sheets as one grid, without sheet headers
    #[arg(long, conflicts_with_all = ["sheet", "json"])]
    flat: bool,

    /// Emit JSON instead of tab-separated text
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One sheet's rendered rows.
#[derive(Debug, Serialize)]
struct SheetDump {
    name: String,
    visibility: SheetVisibility,
    rows: Vec<Vec<String>>,
}

/// Everything dumped from one file.
#[derive(Debug, Serialize)]
struct FileDump {
    file: String,
    sheets: Vec<SheetDump>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args) {
            Ok(output) => match &args.output {
                Some(dir) => {
                    let output_path = get_output_path(input_path, dir, args.json)?;
                    write_output(&output_path, &output)?;
                    if args.verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
                None => print!("{}", output),
            },
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

/// Process a single XLS file.
fn process_file(input_path: &Path, args: &Args) -> Result<String> {
    let mut workbook = xls_biff::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;

    if args.verbose {
        let ctx = workbook.context();
        eprintln!(
            "  {} sheets, {} shared strings, {}",
            workbook.sheet_count(),
            ctx.shared_strings.len(),
            if ctx.legacy { "BIFF5" } else { "BIFF8" }
        );
    }

    let max_rows = args.max_rows.unwrap_or(usize::MAX);

    if args.flat {
        let rows = workbook.read_all_cells(max_rows);
        return Ok(format_rows(&rows));
    }

    let dump = FileDump {
        file: input_path.display().to_string(),
        sheets: collect_sheets(&mut workbook, args.sheet.as_deref(), max_rows)?,
    };

    if args.json {
        let mut json = serde_json::to_string_pretty(&dump).context("Failed to encode JSON")?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(format_dump(&dump))
    }
}

/// Render the selected sheets, stopping once `max_rows` rows are collected.
/// Sheets that fail to parse are reported and left out.
fn collect_sheets<R: std::io::Read + std::io::Seek>(
    workbook: &mut Workbook<R>,
    only: Option<&str>,
    max_rows: usize,
) -> Result<Vec<SheetDump>> {
    let indices: Vec<usize> = match only {
        Some(name) => {
            let index = workbook
                .sheets()
                .position(|s| s.name == name)
                .ok_or_else(|| anyhow::anyhow!("No sheet named '{}'", name))?;
            vec![index]
        }
        None => (0..workbook.sheet_count()).collect(),
    };

    let mut remaining = max_rows;
    let mut sheets = Vec::new();
    for index in indices {
        if remaining == 0 {
            break;
        }
        let sheet = match workbook.sheet(index) {
            Ok(Some(sheet)) => sheet,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Skipping sheet {}: {}", index, e);
                continue;
            }
        };
        let rows: Vec<Vec<String>> = (0..sheet.row_count())
            .take(remaining)
            .map(|row| sheet.row_text(row as u16))
            .collect();
        remaining -= rows.len();

        log::debug!("Sheet '{}': {} rows", sheet.name(), rows.len());
        sheets.push(SheetDump {
            name: sheet.name().to_string(),
            visibility: sheet.descriptor().visibility,
            rows,
        });
    }

    Ok(sheets)
}

fn format_dump(dump: &FileDump) -> String {
    let mut out = String::new();
    for sheet in &dump.sheets {
        out.push_str(&format!("# {}\n", sheet.name));
        out.push_str(&format_rows(&sheet.rows));
    }
    out
}

/// Tab-separated rows, one per line.
fn format_rows(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: &Path, json: bool) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let extension = if json { "json" } else { "tsv" };
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    Ok(output_dir.join(format!("{}.{}", stem, extension)))
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
