use clap::{Parser, Subcommand};

/// Walk, query and edit YAML documents
#[derive(Parser)]
#[command(author, about, long_about=None, disable_version_flag(true))]
pub struct Args {
    /// force color mode (defaults to check tty)
    #[arg(long)]
    pub color: bool,

    /// force no-color mode (defaults to check tty)
    #[arg(long)]
    pub no_color: bool,

    /// display version and quit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// prepend time to each log line
    #[arg(long)]
    pub log_time: bool,

    /// Turn general verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configure component wise logging
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub log: Option<Vec<String>>,

    /// quiet path errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Output YAML instead of raw scalars
    #[arg(short = 'y', long)]
    pub yaml: bool,

    /// Read the document from this file instead of stdin
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<String>,

    #[command(subcommand)]
    pub action: Option<Actions>,
}

#[derive(Subcommand)]
pub enum Actions {
    /// Print the nodes designated by a path
    GetValue {
        /// Dot separated path (`a.b\.c.0.*`)
        #[clap(name = "PATH")]
        path: String,

        /// Printed when the path matches nothing
        #[clap(name = "DEFAULT")]
        default: Option<String>,
    },
    /// Print every scalar value, one per line
    Scalars {
        /// Only walk below this path
        #[clap(name = "PATH")]
        path: Option<String>,

        /// Level order instead of document order
        #[arg(short = 'b', long)]
        breadth_first: bool,

        /// Do not descend below this depth (0 is the immediate children)
        #[arg(short = 'd', long)]
        max_depth: Option<usize>,
    },
    /// Print the keys of a mapping, merge keys resolved
    Keys {
        /// The path to get keys from
        #[clap(name = "PATH")]
        path: Option<String>,

        #[command(flatten)]
        merge: MergeArgs,
    },
    /// Print keys and values of a mapping, merge keys resolved
    KeyValues {
        /// The path to get keys from
        #[clap(name = "PATH")]
        path: Option<String>,

        #[command(flatten)]
        merge: MergeArgs,
    },
    /// Set the value at a path, creating missing mappings
    SetValue {
        #[clap(name = "PATH")]
        path: String,

        #[clap(name = "VALUE")]
        value: String,

        /// Parse VALUE as YAML
        #[arg(short = 'y', long)]
        yaml: bool,
    },
    /// Append a value to the sequence at a path
    Append {
        #[clap(name = "PATH")]
        path: String,

        #[clap(name = "VALUE")]
        value: String,

        /// Parse VALUE as YAML
        #[arg(short = 'y', long)]
        yaml: bool,
    },
    /// Delete the entry or element at a path
    Del {
        #[clap(name = "PATH")]
        path: String,
    },
}

#[derive(clap::Args)]
pub struct MergeArgs {
    /// List keys pulled in by `<<` after the mapping's own keys
    #[arg(long)]
    pub merges_last: bool,

    /// Keep merged keys that the mapping redefines
    #[arg(long)]
    pub allow_duplicate_merge_keys: bool,
}
