use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "accessible")]
#[command(about = "Inspect and exercise declared accessors of class files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved metadata of a class as JSON
    #[command(alias = "i")]
    Inspect {
        /// Class file (JSON or TOML)
        classes: PathBuf,

        /// Class to inspect
        class: String,
    },

    /// Construct an instance and apply accessor calls to it
    Run {
        /// Class file (JSON or TOML)
        classes: PathBuf,

        /// Class to construct
        class: String,

        /// Constructor argument as JSON, in order
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,

        /// Accessor call, e.g. `getFoo` or `addItem=["a"]`
        #[arg(long = "call", value_name = "METHOD[=JSON_ARRAY]")]
        calls: Vec<String>,
    },
}
