//! Interactive picker for indicator tables.
//!
//! Kept separate from clap parsing: clap handles flags, the picker provides
//! the "run `cvm` and choose a company" UX before the dashboard starts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Output directories are flat, but allow one level of nesting (per-run folders).
const DEFAULT_SEARCH_DEPTH: usize = 1;

/// Prompt the user to select an indicator CSV under `dir`.
///
/// Accepts a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_csv_path(dir: &Path) -> Result<PathBuf, AppError> {
    let files = discover_csv_files(dir);
    if files.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No indicator tables found in '{}'. Run `cvm run` first or pass `cvm dash -f <file.csv>`.",
                dir.display()
            ),
        ));
    }

    println!("Found {} indicator table(s) in {}:", files.len(), dir.display());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(dir, path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `cvm dash -f <file.csv>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_csv_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under `dir` (sorted, deterministic).
pub fn discover_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files(dir, 0, DEFAULT_SEARCH_DEPTH, &mut out);
    out.sort();
    out
}

fn find_csv_files(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            find_csv_files(&path, depth + 1, max_depth, out);
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn pretty_path(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_only_csv_tables_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("9512_95123.SA.csv"), "Date\n").unwrap();
        fs::write(dir.path().join("4170_41703.SA.csv"), "Date\n").unwrap();
        fs::write(dir.path().join("run_manifest.json"), "[]").unwrap();

        let files = discover_csv_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| pretty_path(dir.path(), p))
            .collect();
        assert_eq!(names, vec!["4170_41703.SA.csv", "9512_95123.SA.csv"]);
    }

    #[test]
    fn validation_rejects_directories_and_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("run_manifest.json");
        fs::write(&json, "[]").unwrap();

        assert!(validate_csv_path(dir.path()).is_err());
        assert!(validate_csv_path(&json).is_err());
        assert!(validate_csv_path(&dir.path().join("missing.csv")).is_err());
    }
}
