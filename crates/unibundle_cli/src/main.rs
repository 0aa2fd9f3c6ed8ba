#![allow(missing_docs)]

use clap::{ArgAction, Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "unibundle", about = "UnityFS asset bundle inspection and texture export")]
struct Cli {
	/// Increase log verbosity (-v info, -vv debug, -vvv trace).
	#[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print container, block directory, and object table summary.
	Info(cmd::info::Args),
	/// List type trees, or print one class tree.
	Types(cmd::types::Args),
	/// Decode objects through their type trees and print them.
	Decode(cmd::decode::Args),
	/// Decode the atlas and write texture and sprite PNG files.
	Export(cmd::export::Args),
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run(command: Commands) -> unibundle::bundle::Result<()> {
	match command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Types(args) => cmd::types::run(args),
		Commands::Decode(args) => cmd::decode::run(args),
		Commands::Export(args) => cmd::export::run(args),
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => log::LevelFilter::Warn,
		1 => log::LevelFilter::Info,
		2 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};

	env_logger::Builder::from_default_env()
		.filter_level(level)
		.format_timestamp(None)
		.format_target(false)
		.init();
}
