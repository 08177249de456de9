//! Command-line interface for stipple.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct Cli {
    /// `--config <path>`: JSON config file.
    pub config_path: Option<PathBuf>,
    /// `--assets <dir>`: overrides the configured asset root.
    pub asset_root: Option<PathBuf>,
}

impl Cli {
    pub fn parse() -> Self {
        Self::from_args(env::args().skip(1))
    }

    fn from_args(args: impl Iterator<Item = String>) -> Self {
        let mut cli = Cli::default();
        let mut args = args;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => match args.next() {
                    Some(path) => cli.config_path = Some(PathBuf::from(path)),
                    None => log::warn!("--config needs a path; ignoring"),
                },
                "--assets" => match args.next() {
                    Some(dir) => cli.asset_root = Some(PathBuf::from(dir)),
                    None => log::warn!("--assets needs a directory; ignoring"),
                },
                other => log::warn!("unknown argument '{other}'; ignoring"),
            }
        }

        cli
    }
}
