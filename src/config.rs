// This file contains the run configuration: the antiSMASH options a batch is run with, the rules
// that adjust them (--all, glimmerhmm implying fungi, CASSIS conflicts) and the translation of a
// configuration into antiSMASH's command-line arguments.

// Copyright 2024 Leandro de Mattos Pereira

// This file is part of smashbatch. smashbatch is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. smashbatch
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with smashbatch. If not, see <http://www.gnu.org/licenses/>.

use clap::{Args, ValueEnum};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::antismash::Invocation;
use crate::misc::{check_if_dir_exists, check_if_file_exists, format_float, quit_with_error};
use crate::run_log::Level;


#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Taxon {
    Bacteria,
    Fungi,
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Taxon::Bacteria => write!(f, "bacteria"),
            Taxon::Fungi    => write!(f, "fungi"),
        }
    }
}


#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenefindingTool {
    Glimmerhmm,  // eukaryotic gene prediction, only valid for fungi
    Prodigal,
    ProdigalM,   // prodigal in metagenomic mode
    None,        // use only the annotations already in the input
    Error,       // antiSMASH fails if the input has no annotations
}

impl fmt::Display for GenefindingTool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenefindingTool::Glimmerhmm => write!(f, "glimmerhmm"),
            GenefindingTool::Prodigal   => write!(f, "prodigal"),
            GenefindingTool::ProdigalM  => write!(f, "prodigal-m"),
            GenefindingTool::None       => write!(f, "none"),
            GenefindingTool::Error      => write!(f, "error"),
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Analysis {
    Fullhmmer,
    Cassis,
    Clusterhmmer,
    Tigrfam,
    Asf,
    CcMibig,
    CbGeneral,
    CbSubclusters,
    CbKnownclusters,
    Pfam2go,
    Rre,
    SmcogTrees,
    Tfbs,
}

impl Analysis {
    pub const ALL: [Analysis; 13] = [
        Analysis::Fullhmmer, Analysis::Cassis, Analysis::Clusterhmmer, Analysis::Tigrfam,
        Analysis::Asf, Analysis::CcMibig, Analysis::CbGeneral, Analysis::CbSubclusters,
        Analysis::CbKnownclusters, Analysis::Pfam2go, Analysis::Rre, Analysis::SmcogTrees,
        Analysis::Tfbs,
    ];

    pub fn flag(&self) -> &'static str {
        match self {
            Analysis::Fullhmmer       => "--fullhmmer",
            Analysis::Cassis          => "--cassis",
            Analysis::Clusterhmmer    => "--clusterhmmer",
            Analysis::Tigrfam         => "--tigrfam",
            Analysis::Asf             => "--asf",
            Analysis::CcMibig         => "--cc-mibig",
            Analysis::CbGeneral       => "--cb-general",
            Analysis::CbSubclusters   => "--cb-subclusters",
            Analysis::CbKnownclusters => "--cb-knownclusters",
            Analysis::Pfam2go         => "--pfam2go",
            Analysis::Rre             => "--rre",
            Analysis::SmcogTrees      => "--smcog-trees",
            Analysis::Tfbs            => "--tfbs",
        }
    }
}


/// The optional antiSMASH analyses, as given on the command line.
#[derive(Args, Clone, Debug, Default)]
pub struct AnalysisArgs {
    /// Enable all of the additional analyses below
    #[clap(long = "all")]
    pub all: bool,

    /// Run HMMer on the whole genome using Pfam profiles
    #[clap(long = "fullhmmer")]
    pub fullhmmer: bool,

    /// Motif-based prediction of SM gene cluster boundaries
    #[clap(long = "cassis")]
    pub cassis: bool,

    /// Run HMMer on clusters only using Pfam profiles
    #[clap(long = "clusterhmmer")]
    pub clusterhmmer: bool,

    /// Annotate clusters using TIGRFam profiles
    #[clap(long = "tigrfam")]
    pub tigrfam: bool,

    /// Run the active site finder
    #[clap(long = "asf")]
    pub asf: bool,

    /// Compare clusters with the MIBiG database
    #[clap(long = "cc-mibig")]
    pub cc_mibig: bool,

    /// Compare clusters with antiSMASH-predicted clusters
    #[clap(long = "cb-general")]
    pub cb_general: bool,

    /// Compare clusters with known precursor subclusters
    #[clap(long = "cb-subclusters")]
    pub cb_subclusters: bool,

    /// Compare clusters with known clusters from MIBiG
    #[clap(long = "cb-knownclusters")]
    pub cb_knownclusters: bool,

    /// Map Pfam to Gene Ontology
    #[clap(long = "pfam2go")]
    pub pfam2go: bool,

    /// Run RREFinder in precision mode on all RiPP clusters
    #[clap(long = "rre")]
    pub rre: bool,

    /// Generate phylogenetic trees of smCOGs
    #[clap(long = "smcog-trees")]
    pub smcog_trees: bool,

    /// Run the transcription factor binding site finder on all clusters
    #[clap(long = "tfbs")]
    pub tfbs: bool,
}

impl AnalysisArgs {
    pub fn selected(&self) -> BTreeSet<Analysis> {
        if self.all {
            return Analysis::ALL.into_iter().collect();
        }
        let toggles = [
            (self.fullhmmer, Analysis::Fullhmmer),
            (self.cassis, Analysis::Cassis),
            (self.clusterhmmer, Analysis::Clusterhmmer),
            (self.tigrfam, Analysis::Tigrfam),
            (self.asf, Analysis::Asf),
            (self.cc_mibig, Analysis::CcMibig),
            (self.cb_general, Analysis::CbGeneral),
            (self.cb_subclusters, Analysis::CbSubclusters),
            (self.cb_knownclusters, Analysis::CbKnownclusters),
            (self.pfam2go, Analysis::Pfam2go),
            (self.rre, Analysis::Rre),
            (self.smcog_trees, Analysis::SmcogTrees),
            (self.tfbs, Analysis::Tfbs),
        ];
        toggles.into_iter().filter(|(on, _)| *on).map(|(_, a)| a).collect()
    }
}


/// Options controlling antiSMASH's HTML output.
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct HtmlOptions {
    /// Base name for output files within each result directory
    #[clap(long = "output-basename")]
    pub output_basename: Option<String>,

    /// Custom title for the HTML output page
    #[clap(long = "html-title")]
    pub title: Option<String>,

    /// Custom description to add to the HTML output
    #[clap(long = "html-description")]
    pub description: Option<String>,

    /// Use a compact view by default on the overview page
    #[clap(long = "html-start-compact")]
    pub start_compact: bool,

    /// Show links to the NCBI genomic context of genes
    #[clap(long = "html-ncbi-context", overrides_with = "no_ncbi_context")]
    pub ncbi_context: bool,

    /// Do not show links to the NCBI genomic context of genes [default]
    #[clap(long = "no-html-ncbi-context", overrides_with = "ncbi_context")]
    pub no_ncbi_context: bool,
}


#[derive(Clone, Debug, PartialEq)]
pub struct RunConfiguration {
    pub taxon: Taxon,
    pub cpus: usize,
    pub databases: Option<PathBuf>,
    pub genefinding_tool: GenefindingTool,
    pub genefinding_gff3: Option<PathBuf>,
    pub analyses: BTreeSet<Analysis>,
    pub tta_threshold: f64,
    pub html: HtmlOptions,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        RunConfiguration {
            taxon: Taxon::Bacteria,
            cpus: 4,
            databases: None,
            genefinding_tool: GenefindingTool::Error,
            genefinding_gff3: None,
            analyses: BTreeSet::new(),
            tta_threshold: 0.65,
            html: HtmlOptions::default(),
        }
    }
}

impl RunConfiguration {
    pub fn check_settings(&self) {
        if self.cpus < 1 {
            quit_with_error("--cpus must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.tta_threshold) {
            quit_with_error("--tta-threshold must be between 0 and 1");
        }
        if let Some(databases) = &self.databases {
            check_if_dir_exists(databases);
        }
        if let Some(gff3) = &self.genefinding_gff3 {
            check_if_file_exists(gff3);
        }
    }

    pub fn resolve(&self) -> (ResolvedConfiguration, Vec<(Level, String)>) {
        // Applies the rules which make some options override others. The returned notes say
        // what was changed, for the run log.
        let mut config = self.clone();
        let mut notes = Vec::new();
        if config.genefinding_tool == GenefindingTool::Glimmerhmm && config.taxon != Taxon::Fungi {
            config.taxon = Taxon::Fungi;
            notes.push((Level::Info,
                        "Gene-finding tool 'glimmerhmm' selected. Setting taxon to 'fungi'.".to_string()));
        }
        if config.analyses.contains(&Analysis::Cassis) {
            match config.genefinding_tool {
                GenefindingTool::Glimmerhmm => {
                    config.analyses.remove(&Analysis::Cassis);
                    notes.push((Level::Warning,
                                "Disabling --cassis due to conflict with 'glimmerhmm' on eukaryotes.".to_string()));
                }
                GenefindingTool::Prodigal => {
                    config.analyses.remove(&Analysis::Cassis);
                    notes.push((Level::Warning,
                                "CASSIS disabled because gene-finding tool is 'prodigal'.".to_string()));
                }
                _ => {}
            }
        }
        (ResolvedConfiguration(config), notes)
    }
}


/// A configuration with its override rules applied. Only this can be turned into arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfiguration(RunConfiguration);

impl ResolvedConfiguration {
    #[cfg(test)]
    pub fn settings(&self) -> &RunConfiguration {
        &self.0
    }

    pub fn antismash_args(&self, input: &Path, result_dir: &Path) -> Vec<OsString> {
        let c = &self.0;
        let mut args: Vec<OsString> = vec![input.into(),
                                           "--taxon".into(), c.taxon.to_string().into(),
                                           "--cpus".into(), c.cpus.to_string().into()];
        if let Some(databases) = &c.databases {
            args.push("--databases".into());
            args.push(databases.into());
        }
        args.push("--output-dir".into());
        args.push(result_dir.into());

        if let Some(basename) = &c.html.output_basename {
            args.push("--output-basename".into());
            args.push(basename.into());
        }
        if let Some(title) = &c.html.title {
            args.push("--html-title".into());
            args.push(title.into());
        }
        if let Some(description) = &c.html.description {
            args.push("--html-description".into());
            args.push(description.into());
        }
        if c.html.start_compact {
            args.push("--html-start-compact".into());
        }
        if c.html.ncbi_context {
            args.push("--html-ncbi-context".into());
        } else {
            args.push("--no-html-ncbi-context".into());
        }

        for analysis in &c.analyses {
            args.push(analysis.flag().into());
        }
        args.push("--tta-threshold".into());
        args.push(format_float(c.tta_threshold).into());

        args.push("--genefinding-tool".into());
        args.push(c.genefinding_tool.to_string().into());
        if let Some(gff3) = &c.genefinding_gff3 {
            args.push("--genefinding-gff3".into());
            args.push(gff3.into());
        }
        args
    }

    pub fn invocation(&self, input: &Path, result_dir: &Path) -> Invocation {
        Invocation {
            input: input.to_path_buf(),
            result_dir: result_dir.to_path_buf(),
            args: self.antismash_args(input, result_dir),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    fn default_args(config: &RunConfiguration) -> Vec<String> {
        let (resolved, _) = config.resolve();
        args_as_strings(&resolved.antismash_args(Path::new("in/a.fna"), Path::new("out/Result_a")))
    }

    #[test]
    fn test_default_args() {
        assert_eq!(default_args(&RunConfiguration::default()),
                   vec!["in/a.fna", "--taxon", "bacteria", "--cpus", "4",
                        "--output-dir", "out/Result_a", "--no-html-ncbi-context",
                        "--tta-threshold", "0.65", "--genefinding-tool", "error"]);
    }

    #[test]
    fn test_full_args() {
        let mut config = RunConfiguration::default();
        config.taxon = Taxon::Fungi;
        config.cpus = 16;
        config.databases = Some(PathBuf::from("/db"));
        config.genefinding_tool = GenefindingTool::ProdigalM;
        config.genefinding_gff3 = Some(PathBuf::from("genes.gff3"));
        config.analyses = [Analysis::Tfbs, Analysis::Asf].into_iter().collect();
        config.tta_threshold = 0.5;
        config.html = HtmlOptions { output_basename: Some("run".to_string()),
                                    title: Some("My title".to_string()),
                                    description: Some("desc".to_string()),
                                    start_compact: true, ncbi_context: true,
                                    no_ncbi_context: false };
        assert_eq!(default_args(&config),
                   vec!["in/a.fna", "--taxon", "fungi", "--cpus", "16", "--databases", "/db",
                        "--output-dir", "out/Result_a", "--output-basename", "run",
                        "--html-title", "My title", "--html-description", "desc",
                        "--html-start-compact", "--html-ncbi-context", "--asf", "--tfbs",
                        "--tta-threshold", "0.5", "--genefinding-tool", "prodigal-m",
                        "--genefinding-gff3", "genes.gff3"]);
    }

    #[test]
    fn test_all_equals_every_flag() {
        let all = AnalysisArgs { all: true, ..Default::default() };
        let every = AnalysisArgs { all: false, fullhmmer: true, cassis: true, clusterhmmer: true,
                                   tigrfam: true, asf: true, cc_mibig: true, cb_general: true,
                                   cb_subclusters: true, cb_knownclusters: true, pfam2go: true,
                                   rre: true, smcog_trees: true, tfbs: true };
        assert_eq!(all.selected(), every.selected());
        assert_eq!(all.selected().len(), Analysis::ALL.len());

        let mut a = RunConfiguration::default();
        a.analyses = all.selected();
        let mut b = RunConfiguration::default();
        b.analyses = every.selected();
        assert_eq!(default_args(&a), default_args(&b));
    }

    #[test]
    fn test_selected_subset() {
        let args = AnalysisArgs { rre: true, cc_mibig: true, ..Default::default() };
        assert_eq!(args.selected(), [Analysis::CcMibig, Analysis::Rre].into_iter().collect());
        assert!(AnalysisArgs::default().selected().is_empty());
    }

    #[test]
    fn test_analysis_flags_in_fixed_order() {
        let mut config = RunConfiguration::default();
        config.analyses = Analysis::ALL.into_iter().collect();
        let args = default_args(&config);
        let flags: Vec<&str> = args.iter().map(|a| a.as_str())
            .filter(|a| Analysis::ALL.iter().any(|an| an.flag() == *a)).collect();
        let expected: Vec<&str> = Analysis::ALL.iter().map(|a| a.flag()).collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn test_glimmerhmm_forces_fungi() {
        let mut config = RunConfiguration::default();
        config.genefinding_tool = GenefindingTool::Glimmerhmm;
        config.taxon = Taxon::Bacteria;
        let (resolved, notes) = config.resolve();
        assert_eq!(resolved.settings().taxon, Taxon::Fungi);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, Level::Info);
        assert!(default_args(&config).windows(2).any(|w| w[0] == "--taxon" && w[1] == "fungi"));

        config.taxon = Taxon::Fungi;
        let (resolved, notes) = config.resolve();
        assert_eq!(resolved.settings().taxon, Taxon::Fungi);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_other_tools_keep_taxon() {
        for tool in [GenefindingTool::Prodigal, GenefindingTool::ProdigalM,
                     GenefindingTool::None, GenefindingTool::Error] {
            let mut config = RunConfiguration::default();
            config.genefinding_tool = tool;
            let (resolved, _) = config.resolve();
            assert_eq!(resolved.settings().taxon, Taxon::Bacteria);
        }
    }

    #[test]
    fn test_cassis_conflicts() {
        let mut config = RunConfiguration::default();
        config.analyses = [Analysis::Cassis, Analysis::Rre].into_iter().collect();

        config.genefinding_tool = GenefindingTool::Glimmerhmm;
        let (resolved, notes) = config.resolve();
        assert!(!resolved.settings().analyses.contains(&Analysis::Cassis));
        assert!(resolved.settings().analyses.contains(&Analysis::Rre));
        assert!(notes.iter().any(|(level, text)| *level == Level::Warning && text.contains("cassis")));

        config.genefinding_tool = GenefindingTool::Prodigal;
        let (resolved, notes) = config.resolve();
        assert!(!resolved.settings().analyses.contains(&Analysis::Cassis));
        assert_eq!(notes.len(), 1);

        config.genefinding_tool = GenefindingTool::ProdigalM;
        let (resolved, notes) = config.resolve();
        assert!(resolved.settings().analyses.contains(&Analysis::Cassis));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut config = RunConfiguration::default();
        config.genefinding_tool = GenefindingTool::Glimmerhmm;
        config.analyses = Analysis::ALL.into_iter().collect();
        let (once, _) = config.resolve();
        let (twice, notes) = once.settings().resolve();
        assert_eq!(once, twice);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_invocation() {
        let (resolved, _) = RunConfiguration::default().resolve();
        let invocation = resolved.invocation(Path::new("in/b.fasta"), Path::new("out/Result_b"));
        assert_eq!(invocation.input, PathBuf::from("in/b.fasta"));
        assert_eq!(invocation.result_dir, PathBuf::from("out/Result_b"));
        assert_eq!(invocation.args[0], OsString::from("in/b.fasta"));
    }

    #[test]
    #[should_panic(expected = "--cpus must be at least 1")]
    fn test_zero_cpus() {
        let mut config = RunConfiguration::default();
        config.cpus = 0;
        config.check_settings();
    }

    #[test]
    #[should_panic(expected = "--tta-threshold must be between 0 and 1")]
    fn test_bad_tta_threshold() {
        let mut config = RunConfiguration::default();
        config.tta_threshold = 1.5;
        config.check_settings();
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn test_missing_gff3() {
        let mut config = RunConfiguration::default();
        config.genefinding_gff3 = Some(PathBuf::from("/definitely/not/here.gff3"));
        config.check_settings();
    }
}
