use std::{convert::Infallible, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::{command::Arg, config::Config};

/// Talk to a Formula allCode car over its serial link.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a configuration file
    pub config: Option<PathBuf>,

    /// Port identifier, overrides the configuration file.
    /// A number on Linux and Windows, the paired device name on macOS.
    #[arg(short, long)]
    pub port: Option<String>,

    /// Explicit device path, overrides both the port and the configuration file.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Commands available in the command line interface.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the serial ports the operating system knows about.
    Ports,

    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),

    /// Commands sent to the car.
    #[command(flatten)]
    Car(CarCommand),
}

/// Commands which need a connected car.
#[derive(Subcommand, Clone, Debug)]
pub enum CarCommand {
    /// Ask the car for its API version.
    Version,

    /// Send a command without waiting for anything back.
    Send {
        /// The verb, e.g. `LEDOn`.
        verb: String,

        /// Arguments. Integers are sent as such, anything else verbatim.
        #[arg(allow_negative_numbers = true, value_parser = parse_arg)]
        args: Vec<Arg>,
    },

    /// Send a command and wait for an integer reply.
    Query {
        /// The verb, e.g. `ReadIR`.
        verb: String,

        /// Arguments. Integers are sent as such, anything else verbatim.
        #[arg(allow_negative_numbers = true, value_parser = parse_arg)]
        args: Vec<Arg>,

        /// How many one second reads to attempt.
        #[arg(short, long, default_value_t = 1)]
        attempts: u32,
    },
}

/// Helpful examples for users.
#[derive(Subcommand, Clone, Debug)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,
}

fn parse_arg(s: &str) -> Result<Arg, Infallible> {
    s.parse()
}

impl Cli {
    /// The configuration file (or defaults), with command line overrides applied.
    pub fn merged_config(&self, from_file: Option<Config>) -> Config {
        let mut config = from_file.unwrap_or_default();

        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }

        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn query_arguments() {
        let cli = Cli::try_parse_from(["allcode", "-p", "2", "query", "ReadAxis", "1", "-a", "3"])
            .unwrap();

        match cli.command {
            Commands::Car(CarCommand::Query {
                verb,
                args,
                attempts,
            }) => {
                assert_eq!(verb, "ReadAxis");
                assert_eq!(args, vec![Arg::Int(1)]);
                assert_eq!(attempts, 3);
            }
            other => panic!("Unexpected {other:?}"),
        }
    }

    #[test]
    fn send_arguments_keep_their_kind() {
        let cli = Cli::try_parse_from([
            "allcode", "send", "LCDPrint", "10", "-5", "hello.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Car(CarCommand::Send { verb, args }) => {
                assert_eq!(verb, "LCDPrint");
                assert_eq!(
                    args,
                    vec![Arg::Int(10), Arg::Int(-5), Arg::Text("hello.txt".into())]
                );
            }
            other => panic!("Unexpected {other:?}"),
        }
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from(["allcode", "--device", "/dev/ttyUSB1", "version"]).unwrap();

        let config = cli.merged_config(Some(Config::example()));

        assert_eq!(config.device.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.port.as_deref(), Some("0"));
    }
}
