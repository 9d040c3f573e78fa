// This file contains miscellaneous functions used by various parts of smashbatch.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{create_dir_all, read_dir, remove_dir_all};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;


pub fn create_dir(dir_path: &Path) {
    match create_dir_all(dir_path) {
        Ok(_) => {},
        Err(e) => quit_with_error(&format!("failed to create directory {}\n{}", dir_path.display(), e)),
    }
}


pub fn delete_dir_if_exists(dir_path: &Path) -> io::Result<()> {
    // Errors are returned to the caller, since a failed deletion only fails one input file.
    if dir_path.exists() && dir_path.is_dir() {
        remove_dir_all(dir_path)?;
    }
    Ok(())
}


pub fn find_all_sequence_files(in_dir: &Path) -> Vec<PathBuf> {
    let paths = match read_dir(in_dir) {
        Ok(paths) => paths,
        Err(e) => {
            quit_with_error(&format!("unable to read directory {}\n{}", in_dir.display(), e));
        },
    };
    let mut all_files: Vec<PathBuf> = Vec::new();
    for path in paths {
        let path = match path {
            Ok(entry) => entry.path(),
            Err(e) => quit_with_error(&format!("unable to read directory {}\n{}", in_dir.display(), e)),
        };
        if is_sequence_file(&path) {
            all_files.push(path);
        }
    }
    all_files.sort_unstable();
    all_files
}


pub fn is_sequence_file(path: &Path) -> bool {
    path.is_file() &&
        (path.extension().unwrap_or_default() == "fna" ||
         path.extension().unwrap_or_default() == "fasta")
}


pub fn file_stem_string(path: &Path) -> String {
    path.file_stem().unwrap_or_default().to_string_lossy().to_string()
}


pub fn file_name_string(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().to_string()
}


pub fn check_if_file_exists(filename: &Path) {
    // Quits with an error if the given path is not an existing file.
    if !filename.exists() {
        quit_with_error(&format!("file does not exist: {}", filename.display()));
    }
    if !filename.is_file() {
        quit_with_error(&format!("{} is not a file", filename.display()));
    }
}


pub fn check_if_dir_exists(dir: &Path) {
    // Quits with an error if the given path is not an existing directory.
    if !dir.exists() {
        quit_with_error(&format!("directory does not exist: {}", dir.display()));
    }
    if !dir.is_dir() {
        quit_with_error(&format!("{} is not a directory", dir.display()));
    }
}


pub fn check_if_dir_is_not_dir(dir: &Path) {
    // Quits with an error if the given path exists but is not a directory (not existing is okay).
    if dir.exists() && !dir.is_dir() {
        quit_with_error(&format!("{} exists but is not a directory", dir.display()));
    }
}


pub fn check_if_dir_is_writable(dir: &Path) {
    // Quits with an error unless a file can be created (and removed again) in the directory.
    if let Err(e) = NamedTempFile::new_in(dir) {
        quit_with_error(&format!("directory {} is not writable\n{}", dir.display(), e));
    }
}


#[cfg(not(test))]
pub fn quit_with_error(text: &str) -> ! {
    // For friendly error messages, this function normally just prints the error and quits.
    eprintln!();
    eprintln!("Error: {}", text);
    std::process::exit(1);
}
#[cfg(test)]
pub fn quit_with_error(text: &str) -> ! {
    // But when running unit tests, this function instead panics so I can catch it for the test.
    panic!("{}", text);
}


pub fn format_duration(duration: Duration) -> String {
    let microseconds = duration.as_micros() % 1000000;
    let seconds =      duration.as_micros() / 1000000 % 60;
    let minutes =      duration.as_micros() / 1000000 / 60 % 60;
    let hours =        duration.as_micros() / 1000000 / 60 / 60;
    format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, microseconds)
}


pub fn format_float(num: f64) -> String {
    // Formats a float with up to six decimal places but then drops trailing zeros.
    let mut formatted = format!("{:.6}", num);
    if !formatted.contains('.') { return formatted }
    while formatted.ends_with('0') { formatted.pop(); }
    if formatted.ends_with('.') { formatted.pop(); }
    formatted
}


pub fn last_lines(text: &str, count: usize) -> Vec<String> {
    // Returns up to the last `count` non-blank lines of the text, trimmed of trailing whitespace.
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].iter().map(|l| l.to_string()).collect()
}


pub fn spinner(message: &str) -> ProgressBar {
    if cfg!(test) {
        ProgressBar::hidden() // don't show a spinner during unit tests
    } else {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        let style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])  // dots3 from github.com/sindresorhus/cli-spinners
            .template("{spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb
    }
}
