// This file contains the RunLog: the append-only record of what happened to each input file
// during a batch. Every event is timestamped, written to the log file and echoed to stderr.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use chrono::Local;
use colored::Colorize;
use std::fmt;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Info    => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error   => write!(f, "ERROR"),
        }
    }
}


pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
    echo: bool,
}

impl RunLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        // The log is only ever appended to, so earlier runs' events are kept.
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(RunLog { path: path.to_path_buf(), writer: BufWriter::new(file), echo: true })
    }

    #[cfg(test)]
    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&mut self, message: &str) {
        self.event(Level::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.event(Level::Warning, message);
    }

    pub fn error(&mut self, message: &str) {
        self.event(Level::Error, message);
    }

    pub fn event(&mut self, level: Level, message: &str) {
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                               level, message);
        if self.echo {
            match level {
                Level::Info    => eprintln!("{}", line),
                Level::Warning => eprintln!("{}", line.yellow()),
                Level::Error   => eprintln!("{}", line.red()),
            }
        }
        // Flushed per event so the file is current even if the process is killed mid-batch.
        let result = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush());
        if let Err(e) = result {
            eprintln!("{}", format!("failed to write to log file {}: {}",
                                    self.path.display(), e).red());
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}


fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("{} - {} - {}", timestamp, level, message)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::read_to_string;
    use tempfile::tempdir;

    #[test]
    fn test_format_line() {
        assert_eq!(format_line("2024-10-03 12:00:00", Level::Info, "Starting processing."),
                   "2024-10-03 12:00:00 - INFO - Starting processing.");
        assert_eq!(format_line("2024-10-03 12:00:01", Level::Warning, "x"),
                   "2024-10-03 12:00:01 - WARNING - x");
        assert_eq!(format_line("2024-10-03 12:00:02", Level::Error, "y"),
                   "2024-10-03 12:00:02 - ERROR - y");
    }

    #[test]
    fn test_events_are_written_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut log = RunLog::open(&path).unwrap().without_echo();
        log.info("first");
        log.warning("second");
        log.error("third");
        let contents = read_to_string(&path).unwrap();  // read while the log is still open
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" - INFO - first"));
        assert!(lines[1].ends_with(" - WARNING - second"));
        assert!(lines[2].ends_with(" - ERROR - third"));
    }

    #[test]
    fn test_log_is_appended_across_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        {
            let mut log = RunLog::open(&path).unwrap().without_echo();
            log.info("run one");
        }
        {
            let mut log = RunLog::open(&path).unwrap().without_echo();
            log.info("run two");
        }
        let contents = read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("run one"));
        assert!(contents.contains("run two"));
    }

    #[test]
    fn test_missing_parent_dir_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("batch").join("log.txt");
        let log = RunLog::open(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_open_fails_when_path_is_a_directory() {
        let dir = tempdir().unwrap();
        assert!(RunLog::open(dir.path()).is_err());
    }
}
