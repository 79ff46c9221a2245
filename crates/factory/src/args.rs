use crate::opts::{SingletonFactory, SingletonFactorySubcommand};
use clap::Parser;
use eyre::Result;
use singleton_factory_common::utils;

/// Run the `singleton-factory` command line interface.
pub fn run() -> Result<()> {
    setup()?;

    let args = SingletonFactory::parse();
    args.global.init()?;

    run_command(args)
}

/// Setup the error report handler, the environment and the global logger.
pub fn setup() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();
    utils::subscriber();

    Ok(())
}

/// Run the subcommand.
pub fn run_command(args: SingletonFactory) -> Result<()> {
    let global = &args.global;
    match args.cmd {
        SingletonFactorySubcommand::Compile(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Estimate(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Prepare(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::PrepareZk(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Submit(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Verify(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Status(cmd) => global.block_on(cmd.run(global)),
        SingletonFactorySubcommand::Info(cmd) => cmd.run(global),
        SingletonFactorySubcommand::NewChain(cmd) => global.block_on(cmd.run(global)),
    }
}
