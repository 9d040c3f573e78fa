// This is the main file of smashbatch and where execution starts. It mainly handles the CLI and
// then calls into the batch runner.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;
use clap::{Parser, crate_version};

mod antismash;
mod batch;
mod config;
mod log;
mod metrics;
mod misc;
mod run_log;


use crate::config::{AnalysisArgs, GenefindingTool, HtmlOptions, RunConfiguration, Taxon};


#[derive(Parser)]
#[clap(name = "smashbatch",
       version = concat!("v", crate_version!()),
       about = "run antiSMASH on every .fna/.fasta file in a directory, skipping finished ones\n\
                Re-running the same command resumes an interrupted batch.")]
#[command(author, version, long_about = None)]
#[clap(arg_required_else_help = true)]
struct Cli {
    /// Directory containing .fna or .fasta files to analyse (required)
    #[clap(required_unless_present = "antismash_help")]
    input_dir: Option<PathBuf>,

    /// Directory where a Result_<name> directory is made for each input (required)
    #[clap(required_unless_present = "antismash_help")]
    output_dir: Option<PathBuf>,

    /// Display antiSMASH's own help and exit
    #[clap(long = "antismash-help")]
    antismash_help: bool,

    /// antiSMASH executable to run
    #[clap(long = "antismash-bin", default_value = "antismash")]
    antismash_bin: String,

    /// Taxonomic classification of the input sequences (glimmerhmm implies fungi)
    #[clap(short = 't', long = "taxon", value_enum, default_value = "bacteria")]
    taxon: Taxon,

    /// Number of CPUs antiSMASH may use for each file
    #[clap(short = 'c', long = "cpus", default_value = "4")]
    cpus: usize,

    /// Root directory of antiSMASH's databases
    #[clap(long = "databases")]
    databases: Option<PathBuf>,

    /// Gene prediction tool
    #[clap(long = "genefinding-tool", value_enum, default_value = "error")]
    genefinding_tool: GenefindingTool,

    /// GFF3 file to extract features from
    #[clap(long = "genefinding-gff3")]
    genefinding_gff3: Option<PathBuf>,

    #[command(flatten)]
    analyses: AnalysisArgs,

    /// Minimum GC content for annotating TTA codons
    #[clap(long = "tta-threshold", default_value = "0.65")]
    tta_threshold: f64,

    #[command(flatten)]
    html: HtmlOptions,

    /// Log file for processing events [default: <output_dir>/log.txt]
    #[clap(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Exit with status 1 if any file failed (by default failures are only logged)
    #[clap(long = "fail-on-error")]
    fail_on_error: bool,
}

impl Cli {
    fn run_configuration(&self) -> RunConfiguration {
        RunConfiguration {
            taxon: self.taxon,
            cpus: self.cpus,
            databases: self.databases.clone(),
            genefinding_tool: self.genefinding_tool,
            genefinding_gff3: self.genefinding_gff3.clone(),
            analyses: self.analyses.selected(),
            tta_threshold: self.tta_threshold,
            html: self.html.clone(),
        }
    }
}


fn main() {
    let cli = Cli::parse();

    if cli.antismash_help {
        std::process::exit(antismash::antismash_help(&cli.antismash_bin));
    }

    let config = cli.run_configuration();
    match (cli.input_dir, cli.output_dir) {
        (Some(input_dir), Some(output_dir)) => {
            batch::set_interrupt_handler();
            let code = batch::batch(input_dir, output_dir, cli.log_file, config,
                                    &cli.antismash_bin, cli.fail_on_error);
            std::process::exit(code);
        },
        _ => misc::quit_with_error("input_dir and output_dir are required"),
    }
}
