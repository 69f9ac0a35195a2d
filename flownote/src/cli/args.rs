//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Dataset versioning on top of git and dvc
#[derive(Parser, Debug)]
#[command(name = "flownote")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Run as if started in this directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/flownote/flownote.toml)
    #[arg(long = "config", global = true, value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize git and dvc in the current directory
    Init,

    /// Configure remotes
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },

    /// Track files or directories with dvc
    Add {
        /// Files or directories
        #[arg(value_hint = ValueHint::AnyPath)]
        targets: Vec<String>,
        /// Pack each target into `<target>.zip` and track the archive
        #[arg(long)]
        zip: bool,
    },

    /// Stop tracking files or directories
    Remove {
        /// Targets, with or without the `.dvc` suffix
        targets: Vec<String>,
    },

    /// Clone a dataset repository
    Clone {
        /// Repository URL
        url: String,
        /// Output directory
        output_dir: Option<String>,
    },

    /// Commit new and modified pointer files
    Commit {
        /// Commit message
        message: String,
    },

    /// Tag the next version and push git and dvc
    Push {
        /// Tag message (default: the version number)
        message: Option<String>,
        /// Do not pull and merge upstream first
        #[arg(long)]
        skip_merge: bool,
    },

    /// Switch to a version and sync its data
    Checkout {
        /// Tag, branch or commit (default: main branch)
        reference: Option<String>,
        /// Unpack tracked archives afterwards
        #[arg(long)]
        unzip: bool,
    },

    /// Pull the main branch and its data
    Pull {
        /// Unpack tracked archives afterwards
        #[arg(long)]
        unzip: bool,
    },

    /// List data tracked by dvc
    Ls,

    /// Show the current version
    Version,

    /// List all versions with their messages
    Versions,

    /// Remote datasets
    Datasets {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Remote notebooks
    Notebook {
        #[command(subcommand)]
        command: NotebookCommands,
    },

    /// Remote datasources
    Datasources {
        #[command(subcommand)]
        command: DatasourceCommands,
    },

    /// Show settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommands {
    /// Set the git remote (metadata)
    Metadata {
        /// Remote URL, e.g. https://github.com/org/project
        url: String,
    },
    /// Set the dvc remote (data storage)
    Data {
        /// Remote URL, e.g. s3://bucket/path
        url: String,
    },
    /// List git and dvc remotes
    List,
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Download datasets by id
    Pull {
        /// Dataset ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotebookCommands {
    /// Execute a notebook snapshot headlessly
    Run {
        /// Notebook id
        id: String,
        /// Directory for the executed notebook (default: cwd)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output_dir: Option<String>,
        /// Upload the executed notebook
        #[arg(long)]
        upload: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatasourceCommands {
    /// Print the datasource descriptor
    Desc {
        /// Datasource id
        id: String,
    },
    /// Print a database connection string
    #[command(name = "connection_string", alias = "connection-string")]
    ConnectionString {
        /// Datasource id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged settings
    Show,
    /// Show config file path
    Path,
}
