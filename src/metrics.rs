// This file contains the code for tallying the outcome of a batch and writing it to a YAML file.
// It also decides the process exit code from that outcome.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;


pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;  // 128 + SIGINT, as shells report it


#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Failure,
    AlreadyProcessed,
}


#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub file: String,
    pub status: FileStatus,
    pub elapsed_seconds: f64,
}


#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct BatchMetrics {
    pub input_file_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub already_processed_count: u32,
    pub interrupted: bool,
    pub files: Vec<FileRecord>,
}

impl BatchMetrics {
    pub fn new(input_file_count: usize) -> Self {
        BatchMetrics { input_file_count: input_file_count as u32, ..Default::default() }
    }

    pub fn record(&mut self, file: &str, status: FileStatus, elapsed_seconds: f64) {
        match status {
            FileStatus::Success          => self.success_count += 1,
            FileStatus::Failure          => self.failure_count += 1,
            FileStatus::AlreadyProcessed => self.already_processed_count += 1,
        }
        self.files.push(FileRecord { file: file.to_string(), status, elapsed_seconds });
    }

    #[cfg(test)]
    pub fn status_of(&self, file: &str) -> Option<FileStatus> {
        self.files.iter().find(|r| r.file == file).map(|r| r.status)
    }

    pub fn exit_code(&self, fail_on_error: bool) -> i32 {
        // Failed files are normally only reported in the log. They affect the exit code only
        // when the user asks for it.
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if fail_on_error && self.failure_count > 0 {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![format!("Total genomes processed successfully: {}", self.success_count),
             format!("Total genomes failed to process: {}", self.failure_count),
             format!("Total genomes already processed: {}", self.already_processed_count)]
    }

    pub fn save_to_yaml(&self, filename: &Path) -> io::Result<()> {
        let yaml_string = serde_yaml::to_string(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let mut file = File::create(filename)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }
}
