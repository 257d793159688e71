use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sitesensor")]
#[command(about = "Configure SiteSensor devices and exchange recipes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host database (overrides the config file)
    #[arg(long, global = true, env = "SITESENSOR_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage devices on the host
    #[command(subcommand)]
    Device(DeviceCommands),

    /// Read and write raw state variables
    #[command(subcommand)]
    State(StateCommands),

    /// Edit a device's configuration form
    #[command(subcommand)]
    Field(FieldCommands),

    /// Export, import and inspect recipes
    #[command(subcommand)]
    Recipe(RecipeCommands),

    /// Show status indicators
    Status {
        /// Device ID
        device: u32,

        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the child sensor types expressions can publish to
    ChildTypes {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// Register or rename a device
    Add {
        /// Device ID
        id: u32,

        /// Display name
        name: String,

        /// Device type URN
        #[arg(long, default_value = "urn:schemas-toggledbits-com:device:SiteSensor:1")]
        device_type: String,
    },

    /// List devices
    List,
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// Read one state variable
    Get {
        device: u32,
        name: String,

        /// Service ID (defaults to the SiteSensor service)
        #[arg(long)]
        service: Option<String>,
    },

    /// Write one state variable
    Set {
        device: u32,
        name: String,
        value: String,

        #[arg(long)]
        service: Option<String>,

        /// Do not keep the value across restarts
        #[arg(long)]
        transient: bool,
    },

    /// List all state variables of a device
    List { device: u32 },
}

#[derive(Subcommand)]
pub enum FieldCommands {
    /// Show the configuration form and which controls are live
    Show {
        device: u32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Edit one field (managed field name, or Expr<N>, Child<N>, Desc<N>)
    ///
    /// For Headers, separate lines with a literal \n.
    Set {
        device: u32,
        field: String,
        value: String,

        /// Reload the host afterwards without asking
        #[arg(long, conflicts_with = "no_reload")]
        reload: bool,

        /// Never reload the host afterwards
        #[arg(long)]
        no_reload: bool,
    },
}

#[derive(Subcommand)]
pub enum RecipeCommands {
    /// Export a device's configuration as a recipe block
    Export {
        device: u32,

        /// Recipe name (defaults to the last applied recipe, then the device name)
        #[arg(long)]
        name: Option<String>,

        /// Author (defaults to the config file)
        #[arg(long)]
        author: Option<String>,

        #[arg(long, default_value = "")]
        description: String,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a recipe block onto a device
    Import {
        device: u32,

        /// Read from a file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Show the writes without performing them
        #[arg(long)]
        dry_run: bool,

        #[arg(long, conflicts_with = "no_reload")]
        reload: bool,

        #[arg(long)]
        no_reload: bool,
    },

    /// Decode a recipe block and show its contents
    Inspect {
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
