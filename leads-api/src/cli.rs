//! Command-line arguments
//!
//! Every flag also reads an environment variable; anything left unset falls
//! through to the TOML file and then to compiled defaults.

use clap::Parser;
use leads_common::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "leads-api")]
#[command(about = "Lead management service with CSV import")]
#[command(version)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LEADS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the database and upload area
    #[arg(short, long, env = "LEADS_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LEADS_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LEADS_PORT")]
    pub port: Option<u16>,

    /// Gender prediction endpoint
    #[arg(long, env = "LEADS_GENDERIZE_URL")]
    pub genderize_url: Option<String>,
}

impl Args {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            root_folder: self.root_folder,
            host: self.host,
            port: self.port,
            genderize_url: self.genderize_url,
        }
    }
}
