// This file contains the code for running antiSMASH over a directory of genomes. Each genome gets
// its own result directory, and genomes whose result directory already holds an index.html are
// skipped, so an interrupted batch can simply be run again.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use std::collections::BTreeMap;
use std::fs::{create_dir_all, remove_file};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::antismash::{AnalysisTool, Antismash};
use crate::config::{ResolvedConfiguration, RunConfiguration};
use crate::log::{section_header, explanation};
use crate::metrics::{BatchMetrics, FileStatus};
use crate::misc::{check_if_dir_exists, check_if_dir_is_not_dir, check_if_dir_is_writable,
                  create_dir, delete_dir_if_exists, file_name_string, file_stem_string, find_all_sequence_files, format_duration,
                  format_float, last_lines, quit_with_error, spinner};
use crate::run_log::RunLog;


pub const MARKER_FILE: &str = "index.html";
pub const LOG_FILE_NAME: &str = "log.txt";
pub const SUMMARY_FILE_NAME: &str = "batch_summary.yaml";
const RESULT_DIR_PREFIX: &str = "Result_";
const STDERR_TAIL_LINES: usize = 20;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);


pub fn set_interrupt_handler() {
    // ctrl-C and SIGTERM only set the flag: the running antiSMASH is then killed and no further
    // file is started.
    if let Err(e) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst)) {
        eprintln!("Warning: could not install interrupt handler: {}", e);
    }
}


pub fn batch(input_dir: PathBuf, output_dir: PathBuf, log_file: Option<PathBuf>,
             config: RunConfiguration, antismash_bin: &str, fail_on_error: bool) -> i32 {
    let start_time = Instant::now();
    let log_file = log_file.unwrap_or_else(|| output_dir.join(LOG_FILE_NAME));
    check_settings(&input_dir, &output_dir, &config);
    starting_message();
    print_settings(&input_dir, &output_dir, &log_file, &config, antismash_bin, fail_on_error);
    create_dir(&output_dir);
    check_if_dir_is_writable(&output_dir);
    let mut log = open_run_log(&log_file);
    log.info("Starting processing.");
    log.info(&format!("Output directory set to '{}'.", output_dir.display()));

    let (resolved, notes) = config.resolve();
    for (level, note) in notes {
        log.event(level, &note);
    }
    let input_files = find_input_files(&input_dir, &mut log);
    if let Err(e) = check_for_name_collisions(&input_files) {
        log.error(&e);
        quit_with_error(&e);
    }

    let tool = Antismash::new(antismash_bin);
    let metrics = run_batch(&input_files, &output_dir, &resolved, &tool, &mut log, &INTERRUPTED);
    finished_message(&metrics, &output_dir, &mut log, start_time);
    metrics.exit_code(fail_on_error)
}


fn check_settings(input_dir: &Path, output_dir: &Path, config: &RunConfiguration) {
    check_if_dir_exists(input_dir);
    check_if_dir_is_not_dir(output_dir);
    config.check_settings();
}


fn starting_message() {
    section_header("Starting smashbatch");
    explanation("This command runs antiSMASH on each .fna or .fasta file in the input directory, \
                 saving the results for each file in its own Result_ directory. Files whose \
                 result directory already contains an index.html are skipped, and incomplete \
                 result directories are deleted and redone.");
}


fn print_settings(input_dir: &Path, output_dir: &Path, log_file: &Path, config: &RunConfiguration,
                  antismash_bin: &str, fail_on_error: bool) {
    eprintln!("Settings:");
    eprintln!("  input_dir {}", input_dir.display());
    eprintln!("  output_dir {}", output_dir.display());
    eprintln!("  --taxon {}", config.taxon);
    eprintln!("  --cpus {}", config.cpus);
    if let Some(databases) = &config.databases {
        eprintln!("  --databases {}", databases.display());
    }
    eprintln!("  --genefinding-tool {}", config.genefinding_tool);
    if let Some(gff3) = &config.genefinding_gff3 {
        eprintln!("  --genefinding-gff3 {}", gff3.display());
    }
    let analyses: Vec<&str> = config.analyses.iter().map(|a| a.flag()).collect();
    if analyses.is_empty() {
        eprintln!("  analyses: none");
    } else {
        eprintln!("  analyses: {}", analyses.join(" "));
    }
    eprintln!("  --tta-threshold {}", format_float(config.tta_threshold));
    eprintln!("  --log-file {}", log_file.display());
    eprintln!("  --antismash-bin {}", antismash_bin);
    if fail_on_error {
        eprintln!("  --fail-on-error");
    }
    eprintln!();
}


fn open_run_log(log_file: &Path) -> RunLog {
    match RunLog::open(log_file) {
        Ok(log) => log,
        Err(e) => quit_with_error(&format!("unable to open log file {}\n{}", log_file.display(), e)),
    }
}


fn find_input_files(input_dir: &Path, log: &mut RunLog) -> Vec<PathBuf> {
    let input_files = find_all_sequence_files(input_dir);
    if input_files.is_empty() {
        log.warning(&format!("No .fna or .fasta files found in '{}'.", input_dir.display()));
    } else {
        log.info(&format!("Found {} files for processing.", input_files.len()));
    }
    input_files
}


pub fn check_for_name_collisions(input_files: &[PathBuf]) -> Result<(), String> {
    // Result directories are named by file stem, so x.fna and x.fasta would share one.
    let mut by_stem: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for f in input_files {
        by_stem.entry(file_stem_string(f)).or_default().push(file_name_string(f));
    }
    let collisions: Vec<String> = by_stem.into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(stem, names)| format!("{} ({})", result_dir_name(&stem), names.join(", ")))
        .collect();
    if collisions.is_empty() {
        Ok(())
    } else {
        Err(format!("input files would share a result directory: {}", collisions.join("; ")))
    }
}


fn result_dir_name(stem: &str) -> String {
    format!("{}{}", RESULT_DIR_PREFIX, stem)
}


pub fn result_dir_for(output_dir: &Path, input: &Path) -> PathBuf {
    output_dir.join(result_dir_name(&file_stem_string(input)))
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultState {
    Missing,
    Partial,   // exists but has no marker file, i.e. left by an interrupted or failed run
    Complete,
}

pub fn result_state(result_dir: &Path) -> ResultState {
    if !result_dir.exists() {
        ResultState::Missing
    } else if result_dir.is_dir() && result_dir.join(MARKER_FILE).is_file() {
        ResultState::Complete
    } else {
        ResultState::Partial
    }
}


fn remove_partial_result(result_dir: &Path) -> io::Result<()> {
    if result_dir.is_dir() {
        delete_dir_if_exists(result_dir)
    } else {
        remove_file(result_dir)
    }
}


pub fn run_batch(input_files: &[PathBuf], output_dir: &Path, config: &ResolvedConfiguration,
                 tool: &dyn AnalysisTool, log: &mut RunLog, stop: &AtomicBool) -> BatchMetrics {
    let mut metrics = BatchMetrics::new(input_files.len());
    for (i, input) in input_files.iter().enumerate() {
        let file_start = Instant::now();
        let status = process_file(input, output_dir, config, tool, log, stop);
        metrics.record(&file_name_string(input), status, file_start.elapsed().as_secs_f64());
        if stop.load(Ordering::SeqCst) {
            metrics.interrupted = true;
            log.warning(&format!("Batch interrupted after '{}'. {} file(s) not attempted. \
                                  Run the same command again to resume.",
                                 file_name_string(input), input_files.len() - i - 1));
            break;
        }
    }
    metrics
}


pub fn process_file(input: &Path, output_dir: &Path, config: &ResolvedConfiguration,
                    tool: &dyn AnalysisTool, log: &mut RunLog, stop: &AtomicBool) -> FileStatus {
    let name = file_name_string(input);
    let result_dir = result_dir_for(output_dir, input);

    match result_state(&result_dir) {
        ResultState::Complete => {
            log.info(&format!("File '{}' was already processed and '{}' exists. Skipping.",
                              name, MARKER_FILE));
            return FileStatus::AlreadyProcessed;
        }
        ResultState::Partial => {
            log.warning(&format!("File '{}' was partially processed before and '{}' is missing. \
                                  Reprocessing.", name, MARKER_FILE));
            if let Err(e) = remove_partial_result(&result_dir) {
                log.error(&format!("Error removing directory '{}': {}", result_dir.display(), e));
                return FileStatus::Failure;
            }
            log.info(&format!("Directory '{}' removed for reprocessing.", result_dir.display()));
        }
        ResultState::Missing => {}
    }

    if let Err(e) = create_dir_all(&result_dir) {
        log.error(&format!("Error creating directory '{}': {}", result_dir.display(), e));
        return FileStatus::Failure;
    }
    log.info(&format!("Created result directory: '{}'.", result_dir.display()));

    let invocation = config.invocation(input, &result_dir);
    log.info(&format!("Starting processing of file '{}' with {}.", name, tool.name()));
    let start_time = Instant::now();
    let pb = spinner(&format!("running {} on {}...", tool.name(), name));
    let outcome = tool.run(&invocation, stop);
    pb.finish_and_clear();
    let elapsed = format_duration(start_time.elapsed());

    match outcome {
        Ok(output) if output.success() => {
            if result_state(&result_dir) == ResultState::Complete {
                log.info(&format!("Successfully processed file '{}' in {}.", name, elapsed));
                FileStatus::Success
            } else {
                log.error(&format!("Error processing file '{}': {} finished but did not write \
                                    '{}'.", name, tool.name(), MARKER_FILE));
                FileStatus::Failure
            }
        }
        Ok(output) => {
            log.error(&format!("Error processing file '{}': {} failed with {} after {}.",
                               name, tool.name(), output.status_description(), elapsed));
            for line in last_lines(&output.stderr, STDERR_TAIL_LINES) {
                log.error(&format!("[{}] {}", name, line));
            }
            FileStatus::Failure
        }
        Err(e) => {
            log.error(&format!("Error processing file '{}': {}", name, e));
            FileStatus::Failure
        }
    }
}


fn finished_message(metrics: &BatchMetrics, output_dir: &Path, log: &mut RunLog,
                    start_time: Instant) {
    let summary_yaml = output_dir.join(SUMMARY_FILE_NAME);
    if let Err(e) = metrics.save_to_yaml(&summary_yaml) {
        log.error(&format!("Error writing summary '{}': {}", summary_yaml.display(), e));
    }
    if metrics.interrupted {
        log.warning("Processing interrupted.");
    } else {
        log.info("Processing complete.");
    }
    for line in metrics.summary_lines() {
        log.info(&line);
    }

    section_header("Finished!");
    for line in metrics.summary_lines() {
        eprintln!("{}", line);
    }
    eprintln!();
    eprintln!("Log file: {}", log.path().display());
    eprintln!("Summary:  {}", summary_yaml.display());
    eprintln!("Time to run: {}", format_duration(start_time.elapsed()));
    if metrics.failure_count > 0 {
        explanation("Failed files keep their incomplete result directories. Run the same \
                     command again to retry them: completed files will be skipped.");
    }
}
