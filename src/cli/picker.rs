//! Interactive dataset picker for `econlab upload` without a path.
//!
//! Lists `*.csv` files under the working directory and reads a choice (a
//! number or an explicit path) from stdin.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

const SEARCH_DEPTH: usize = 4;

pub fn prompt_for_dataset() -> Result<PathBuf, AppError> {
    let files = discover_datasets(Path::new("."));
    if files.is_empty() {
        return Err(AppError::new(2, "No .csv files found. Run `econlab upload <file.csv>`."));
    }

    println!("Datasets found ({}):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, display_path(path));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Dataset number (1-{}), path, or q: ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::new(2, "No input received."));
        };
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        match resolve_choice(line.trim(), &files) {
            Choice::Quit => return Err(AppError::new(2, "Canceled.")),
            Choice::Picked(path) => match validate_dataset_path(&path) {
                Ok(path) => return Ok(path),
                Err(err) => println!("{err}"),
            },
            Choice::OutOfRange(n) => println!("No dataset #{n}."),
        }
    }
}

enum Choice {
    Quit,
    Picked(PathBuf),
    OutOfRange(usize),
}

fn resolve_choice(input: &str, files: &[PathBuf]) -> Choice {
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=files.len()).contains(&n) => Choice::Picked(files[n - 1].clone()),
        Ok(n) => Choice::OutOfRange(n),
        Err(_) => Choice::Picked(PathBuf::from(input)),
    }
}

/// Only existing `.csv` files are uploaded.
pub fn validate_dataset_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_file() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Only CSV files are supported (got: {}).", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root`, sorted for a stable listing.
pub fn discover_datasets(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out.sort_by_key(|p| display_path(p));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if !matches!(name, ".git" | "target" | "node_modules") {
                walk(&path, depth + 1, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}
