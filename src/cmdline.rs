//! Command line parsing for the wiresched binary.
use argh::FromArgs;
use std::path::PathBuf;
use wiresched_opt::config::SchedConfig;
use wiresched_utils::{OutputFile, SchedResult};

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help"))]
/// Schedule the basic blocks of a finite-state machine and pick a wire plan
pub struct Opts {
    /// input table in JSON
    #[argh(positional)]
    pub file: PathBuf,

    /// output file, default is stdout
    #[argh(
        option,
        short = 'o',
        long = "output",
        default = "OutputFile::Stdout"
    )]
    pub output: OutputFile,

    /// scheduler configuration in JSON. Flags override its values
    #[argh(option, long = "config")]
    pub config: Option<PathBuf>,

    /// largest combinational delay allowed within one state
    #[argh(option, long = "max-delay")]
    pub max_delay: Option<u32>,

    /// blocks needing more states than this are infeasible
    #[argh(option, long = "max-states")]
    pub max_states: Option<usize>,

    /// uses per replica above which a resource gets another replica
    #[argh(option, long = "usage-threshold")]
    pub usage_threshold: Option<f64>,

    /// relative mux complexity reduction a new wire plan must achieve
    #[argh(option, long = "min-improvement")]
    pub min_improvement: Option<f64>,

    /// number of wire plans evaluated before giving up
    #[argh(option, long = "max-iterations")]
    pub max_iterations: Option<usize>,

    /// print the data path of every block under the accepted plan to stderr
    #[argh(switch, long = "dump-data-path")]
    pub dump_data_path: bool,

    /// logging level
    #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}

impl Opts {
    /// Parse the command line.
    pub fn get_opts() -> Self {
        argh::from_env()
    }

    /// The configuration file, if any, with command line overrides applied.
    pub fn sched_config(&self) -> SchedResult<SchedConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let src = std::fs::read_to_string(path)?;
                serde_json::from_str(&src)?
            }
            None => SchedConfig::default(),
        };
        if let Some(d) = self.max_delay {
            config.max_delay = d;
        }
        if self.max_states.is_some() {
            config.max_states = self.max_states;
        }
        if let Some(t) = self.usage_threshold {
            config.explorer.usage_threshold = t;
        }
        if let Some(m) = self.min_improvement {
            config.explorer.min_improvement = m;
        }
        if let Some(n) = self.max_iterations {
            config.explorer.max_iterations = n;
        }
        Ok(config)
    }
}
