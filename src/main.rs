use allcode_link::{
    car::Car,
    cli::{self, CarCommand, Commands, Examples},
    command::{Command, Verb},
    config::Config,
    logging, platform,
};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, Level};

async fn run(car: &mut Car, command: CarCommand) -> Result<()> {
    match command {
        CarCommand::Version => {
            let version = car.api_version().await?;
            println!("{version}");
        }
        CarCommand::Send { verb, args } => {
            let command = Command::new(verb.parse::<Verb>()?).args(args);
            car.send_command(&command).await?;
        }
        CarCommand::Query {
            verb,
            args,
            attempts,
        } => {
            let command = Command::new(verb.parse::<Verb>()?).args(args);
            car.flush_incoming()?;
            let value = car.send_command_and_read_int(&command, attempts).await?;
            println!("{value}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();

    let command = match &cli.command {
        Commands::Examples(Examples::Config) => {
            println!("{}", Config::example().serialize_pretty()?);
            return Ok(());
        }
        Commands::Ports => {
            for port in platform::available_ports()? {
                println!("{port}");
            }
            return Ok(());
        }
        Commands::Car(command) => command.clone(),
    };

    let from_file = cli.config.as_ref().map(Config::new_from_path).transpose()?;
    let config = cli.merged_config(from_file);
    config.validate()?;

    logging::init(
        config.level()?,
        config.log_dir.clone().map(|dir| (Level::DEBUG, dir)),
    )
    .await;
    debug!(?config, "Using config");

    let mut car = Car::new();
    match (&config.device, &config.port) {
        (Some(device), _) => car.open_path(device)?,
        (None, Some(port)) => car.open(port)?,
        (None, None) => return Err(eyre!("Nothing to connect to")),
    }

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting");
            Ok(())
        }
        outcome = run(&mut car, command) => outcome,
    };

    car.close().await?;

    outcome
}
