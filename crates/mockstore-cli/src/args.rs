use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mockstore")]
#[command(about = "Seed and inspect the data directory of a mocked REST API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base directory of the JSON files (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file to load (defaults to mockstore.toml in the data directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Compare paths case-sensitively
    #[arg(long, global = true)]
    pub case_sensitive: bool,

    /// Treat trailing slashes as significant
    #[arg(long, global = true)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one resource
    Get {
        /// Resource path (e.g. /users/jdoe)
        path: String,
    },

    /// Print every resource in a collection
    #[command(alias = "ls")]
    List {
        /// Collection path (e.g. /users)
        collection: String,
    },

    /// Save a resource, merging into any existing data
    Save {
        /// Resource path (e.g. /users/jdoe)
        path: String,

        /// JSON payload
        data: String,
    },

    /// Save several resources into one collection
    SaveCollection {
        /// Collection path (e.g. /users)
        collection: String,

        /// JSON object mapping resource names to their data
        items: String,
    },

    /// Delete one resource
    #[command(alias = "rm")]
    Delete {
        /// Resource path (e.g. /users/jdoe)
        path: String,
    },

    /// Delete a whole collection, or only the named resources in it
    DeleteCollection {
        /// Collection path (e.g. /users)
        collection: String,

        /// Resource names to delete (all when omitted)
        names: Vec<String>,
    },
}
