mod config;
mod dump;
mod source;
#[cfg(test)]
mod testutil;
mod walk;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use crate::config::Config;
use crate::source::kallsyms::Kallsyms;
use crate::source::procfs::ProcFs;
use crate::walk::{FileWalker, KsymWalker, SeqFile, TaskFormat, TaskWalker};

#[derive(Parser)]
#[command(
    name = "kscan",
    about = "Dump the kernel's process, open-file and symbol tables as text records"
)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Config file (default: ~/.config/kscan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where procfs is mounted
    #[arg(long, global = true)]
    proc_root: Option<PathBuf>,

    /// Write records here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One line per process
    Tasks {
        /// Only pid, ppid and comm
        #[arg(long)]
        basic: bool,
    },
    /// One line per open file descriptor
    Files,
    /// Kernel symbols with address deltas
    Ksyms,
    /// Tasks, files and symbols, one after another
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    TermLogger::init(
        cli.verbose.log_level_filter(),
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("initializing logger")?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // CLI overrides
    if let Some(root) = cli.proc_root {
        config.general.proc_root = root;
    }
    if let Command::Tasks { basic: true } = cli.command {
        config.tasks.format = TaskFormat::Basic;
    }

    if !nix::unistd::Uid::effective().is_root() {
        log::warn!("not running as root: descriptors, executables and symbol addresses may be hidden");
    }

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = SeqFile::new(BufWriter::new(sink));

    let procfs = ProcFs::new(&config.general.proc_root);
    match cli.command {
        Command::Tasks { .. } => run_tasks(&config, &procfs, &mut out)?,
        Command::Files => run_files(&config, &procfs, &mut out)?,
        Command::Ksyms => run_ksyms(&procfs, &mut out)?,
        Command::All => {
            run_tasks(&config, &procfs, &mut out)?;
            run_files(&config, &procfs, &mut out)?;
            run_ksyms(&procfs, &mut out)?;
        }
    }

    out.flush().context("flushing output")?;
    if out.truncated() > 0 {
        log::warn!("{} of {} lines were truncated", out.truncated(), out.lines());
    }
    Ok(())
}

fn run_tasks<W: Write>(config: &Config, procfs: &ProcFs, out: &mut SeqFile<W>) -> Result<()> {
    let mut walker = TaskWalker::new(config.tasks.format, config.tasks.reuse_stale_values);
    dump::tasks(procfs, &mut walker, out)?;
    Ok(())
}

fn run_files<W: Write>(config: &Config, procfs: &ProcFs, out: &mut SeqFile<W>) -> Result<()> {
    let mut walker = FileWalker::new(config.files.reuse_stale_values);
    dump::files(procfs, &mut walker, out)?;
    Ok(())
}

fn run_ksyms<W: Write>(procfs: &ProcFs, out: &mut SeqFile<W>) -> Result<()> {
    let symbols = Kallsyms::open(&procfs.root().join("kallsyms"))?;
    let mut walker = KsymWalker::new();
    dump::ksyms(symbols, &mut walker, out)?;
    Ok(())
}
