use std::path::PathBuf;

use anyhow::bail;
use clap::{ArgAction, Parser, Subcommand};
use evm_eof::corpus;
use evm_eof_jsontests::{eofparse, run, TestCompletionStatus, DEFAULT_FORK};

#[derive(Parser)]
#[command(name = "evm-eof-jsontests", version, about = "EOF v1 validation fixtures")]
struct Cli {
	/// Raise log verbosity, repeat for more.
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Write the corpus as fixture files.
	Fill {
		#[arg(short, long)]
		output: PathBuf,
		#[arg(long, default_value = DEFAULT_FORK)]
		fork: String,
	},
	/// Check fixture files, or the generated corpus when none are given,
	/// against the validator.
	Check {
		paths: Vec<PathBuf>,
		#[arg(long, default_value = DEFAULT_FORK)]
		fork: String,
	},
	/// Cross-check the generated corpus with `evmone-eofparse`.
	Verify {
		#[arg(long)]
		evmone: PathBuf,
	},
}

fn init_logger(verbose: u8) {
	let mut builder = env_logger::Builder::from_default_env();
	match verbose {
		0 => {}
		1 => {
			builder.filter_level(log::LevelFilter::Info);
		}
		2 => {
			builder.filter_level(log::LevelFilter::Debug);
		}
		_ => {
			builder.filter_level(log::LevelFilter::Trace);
		}
	}
	builder.init();
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logger(cli.verbose);

	match cli.command {
		Command::Fill { output, fork } => {
			let written = run::fill(&output, &fork)?;
			println!("wrote {} fixture files to {}", written.len(), output.display());
		}
		Command::Check { paths, fork } => {
			let mut status = TestCompletionStatus::default();
			if paths.is_empty() {
				status += run::check_corpus(&corpus::all());
			}
			for path in &paths {
				status += run::check_path(path, &fork)?;
			}
			status.print_total();
			if status.failed > 0 {
				bail!("{} vectors failed", status.failed);
			}
		}
		Command::Verify { evmone } => {
			let cases = corpus::all();
			eofparse::verify(&evmone, &cases)?;
			println!("{} containers agree with {}", cases.len(), evmone.display());
		}
	}

	Ok(())
}
