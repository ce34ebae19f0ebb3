mod cmd;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::util::config::{Config, Configs};
use crate::util::logging::{setup_logging, LevelFilter};

#[derive(clap::Parser)]
#[clap(
    name = "em9301",
    about = "Inspect EM9304 patch blobs and generate vendor HCI commands",
    version
)]
struct Cli {
    /// Location for log file
    ///
    /// The file receives JSON formatted log lines, in addition to the ones printed on stderr.
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,
    /// The level of log output. Overrides the config file and RUST_LOG.
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LevelFilter>,

    /// Directory searched for Em9301.toml and friends. Defaults to the working directory.
    #[clap(long, global = true, help_heading = "CONFIGURATION")]
    config_dir: Option<PathBuf>,
    /// An additional config file, merged last
    #[clap(long, global = true, help_heading = "CONFIGURATION")]
    config: Option<PathBuf>,
    /// The config profile to use
    #[clap(
        long,
        global = true,
        default_value = "default",
        env = "EM9301_PROFILE",
        help_heading = "CONFIGURATION"
    )]
    profile: String,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

impl Cli {
    fn run(self, config: Config) -> Result<()> {
        match self.subcommand {
            Subcommand::Info(cmd) => cmd.run(),
            Subcommand::Frames(cmd) => cmd.run(&config),
            Subcommand::Baudrate(cmd) => cmd.run(&config),
            Subcommand::Address(cmd) => cmd.run(&config),
            Subcommand::Crc32(cmd) => cmd.run(),
        }
    }
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// List the containers of a patch blob
    Info(cmd::info::Cmd),
    /// Generate the HCI commands uploading a patch blob
    Frames(cmd::frames::Cmd),
    /// Print the command changing the UART speed
    Baudrate(cmd::baudrate::Cmd),
    /// Print the command setting the public device address
    Address(cmd::address::Cmd),
    /// Print the CRC32 of a file
    Crc32(cmd::crc32::Cmd),
}

fn load_config(matches: &Cli) -> Result<Config> {
    let conf_dir = match &matches.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Unable to determine the working directory.")?,
    };

    let mut configs = Configs::new(conf_dir);
    if let Some(config) = &matches.config {
        configs.merge(config.clone())?;
    }

    configs.select_defined(&matches.profile)
}

fn main() -> Result<()> {
    // Parse the commandline options.
    let matches = Cli::parse();

    let config = load_config(&matches).context("Failed to load configuration.")?;

    let log_path = matches.log_file.clone();
    let _logger_guard = setup_logging(
        log_path.as_deref(),
        matches.log_level.or(config.general.log_level),
    )?;

    matches.run(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "em9301",
            "frames",
            "patch.bin",
            "--format",
            "json",
            "--log-level",
            "DEBUG",
            "--profile",
            "uart",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        assert_eq!(cli.profile, "uart");
        assert!(matches!(cli.subcommand, Subcommand::Frames(_)));
    }

    #[test]
    fn baudrate_accepts_hex() {
        let cli = Cli::try_parse_from(["em9301", "baudrate", "0x1c200"]).unwrap();

        assert!(matches!(cli.subcommand, Subcommand::Baudrate(_)));
    }

    #[test]
    fn address_is_validated() {
        assert!(Cli::try_parse_from(["em9301", "address", "00:11:22:33:44:55"]).is_ok());
        assert!(Cli::try_parse_from(["em9301", "address", "00:11:22:33:44"]).is_err());
    }
}
