// This file contains the code that runs antiSMASH as an external program. The batch runner only
// talks to antiSMASH through the AnalysisTool trait, so it can be swapped out in tests.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use which::which;

use crate::misc::quit_with_error;


const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STDERR_WAIT: Duration = Duration::from_secs(2);


/// One run of the analysis tool on one input file.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub input: PathBuf,
    pub result_dir: PathBuf,
    pub args: Vec<OsString>,
}


#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,  // None if the process was killed by a signal
    pub stderr: String,
    pub interrupted: bool,       // killed by us because the batch was stopped
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_description(&self) -> String {
        match self.exit_code {
            _ if self.interrupted => "termination because the batch was interrupted".to_string(),
            Some(code) => format!("exit code {}", code),
            None       => "termination by signal".to_string(),
        }
    }
}


pub trait AnalysisTool {
    fn name(&self) -> &str;

    /// Runs the tool until it exits, or until `stop` is set, in which case the tool is killed.
    /// Err means it could not be started at all.
    fn run(&self, invocation: &Invocation, stop: &AtomicBool) -> Result<ToolOutput, String>;
}


pub struct Antismash {
    program: String,
}

impl Antismash {
    pub fn new(program: &str) -> Self {
        Antismash { program: program.to_string() }
    }

    fn find_program(&self) -> Result<PathBuf, String> {
        which(&self.program)
            .map_err(|_| format!("required program '{}' not found in $PATH", self.program))
    }
}

impl AnalysisTool for Antismash {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, invocation: &Invocation, stop: &AtomicBool) -> Result<ToolOutput, String> {
        // Looked up per file: a missing program is a per-file failure, not a fatal one.
        let program = self.find_program()?;
        let mut child = Command::new(&program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to run {} on {} (output in {}): {}", program.display(),
                                 invocation.input.display(), invocation.result_dir.display(), e))?;
        let stderr = read_stderr_in_background(&mut child);

        let mut interrupted = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    return Err(format!("failed waiting for {} on {}: {}", program.display(),
                                       invocation.input.display(), e));
                }
            }
            if !interrupted && stop.load(Ordering::SeqCst) {
                interrupted = true;
                let _ = child.kill();
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Grandchildren of a killed run can hold the pipe open, so stderr is not waited on forever.
        Ok(ToolOutput {
            exit_code: status.code(),
            stderr: stderr.recv_timeout(STDERR_WAIT).unwrap_or_default(),
            interrupted,
        })
    }
}


fn read_stderr_in_background(child: &mut Child) -> mpsc::Receiver<String> {
    // Drained on its own thread so a chatty tool can't fill the pipe and block.
    let (sender, receiver) = mpsc::channel();
    if let Some(mut pipe) = child.stderr.take() {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            let _ = sender.send(String::from_utf8_lossy(&bytes).to_string());
        });
    }
    receiver
}


pub fn antismash_help(program: &str) -> i32 {
    // Shows antiSMASH's own help text (stdio is inherited) and returns its exit code.
    let path = which(program).unwrap_or_else(|_| {
        quit_with_error(&format!("required program '{}' not found in $PATH", program))
    });
    match Command::new(&path).arg("--help").status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => quit_with_error(&format!("failed to run {}\n{}", path.display(), e)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: Option<i32>, stderr: &str, interrupted: bool) -> ToolOutput {
        ToolOutput { exit_code, stderr: stderr.to_string(), interrupted }
    }

    fn shell_invocation(script: &str) -> Invocation {
        Invocation { input: PathBuf::from("a.fna"),
                     result_dir: PathBuf::from("Result_a"),
                     args: vec![OsString::from("-c"), OsString::from(script)] }
    }

    #[test]
    fn test_tool_output() {
        let ok = output(Some(0), "", false);
        assert!(ok.success());
        assert_eq!(ok.status_description(), "exit code 0");
        let failed = output(Some(2), "bad input", false);
        assert!(!failed.success());
        assert_eq!(failed.status_description(), "exit code 2");
        let killed = output(None, "", false);
        assert!(!killed.success());
        assert_eq!(killed.status_description(), "termination by signal");
        let stopped = output(None, "", true);
        assert!(!stopped.success());
        assert_eq!(stopped.status_description(),
                   "termination because the batch was interrupted");
    }

    #[test]
    fn test_missing_program() {
        let tool = Antismash::new("smashbatch-no-such-antismash-binary");
        let invocation = Invocation { input: PathBuf::from("a.fna"),
                                      result_dir: PathBuf::from("Result_a"),
                                      args: vec![] };
        let err = tool.run(&invocation, &AtomicBool::new(false)).unwrap_err();
        assert_eq!(err, "required program 'smashbatch-no-such-antismash-binary' not found in $PATH");
        assert_eq!(tool.name(), "smashbatch-no-such-antismash-binary");
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_and_stderr_are_captured() {
        let tool = Antismash::new("sh");
        let invocation = shell_invocation("echo to-stdout; echo 'ERROR: bad record' >&2; exit 3");
        let result = tool.run(&invocation, &AtomicBool::new(false)).unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.interrupted);
        assert_eq!(result.stderr, "ERROR: bad record\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_kills_running_program() {
        // A long antiSMASH run must not outlive an interrupt of the batch.
        let tool = Antismash::new("sh");
        let invocation = shell_invocation("echo started >&2; exec sleep 30");
        let stop = AtomicBool::new(false);
        let start = std::time::Instant::now();
        let result = thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(300));
                stop.store(true, Ordering::SeqCst);
            });
            tool.run(&invocation, &stop).unwrap()
        });
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(result.interrupted);
        assert!(!result.success());
        assert_eq!(result.exit_code, None);
        assert!(result.stderr.contains("started"));
    }

    #[test]
    #[should_panic(expected = "not found in $PATH")]
    fn test_help_with_missing_program() {
        antismash_help("smashbatch-no-such-antismash-binary");
    }
}
