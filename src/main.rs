use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, warn};

use sopatch::elf::DynamicInfo;
use sopatch::patch::{self, PadMode, PatchOptions};
use sopatch::rules::RuleSet;

#[derive(Parser)]
#[command(
    name = "sopatch",
    version,
    about = "Length-preserving string patching for prebuilt shared libraries"
)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Redirect known C++ runtime dependencies to a library already present
    ForcePatch {
        /// Shared library to patch in place
        path: PathBuf,

        /// TOML file with [[rule]] pattern/replacement tables
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Report matches without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename a DT_NEEDED or SONAME string
    PatchNeeded {
        path: PathBuf,
        old_name: String,
        new_name: String,

        /// Fail instead of NUL-padding a shorter name
        #[arg(long)]
        exact: bool,

        /// Only match names followed by a NUL terminator
        #[arg(long)]
        nul_terminated: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Replace an rpath string, NUL-padding the new value
    PatchRpath {
        path: PathBuf,
        old_string: String,
        new_string: String,

        /// Only match strings followed by a NUL terminator
        #[arg(long)]
        nul_terminated: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Show SONAME, NEEDED, RPATH and RUNPATH entries
    Inspect { path: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {:#}", "error".red(), e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::ForcePatch {
            path,
            rules,
            dry_run,
        } => cmd_force_patch(&path, rules.as_deref(), dry_run),
        Command::PatchNeeded {
            path,
            old_name,
            new_name,
            exact,
            nul_terminated,
            dry_run,
        } => {
            if !exact && new_name.len() < old_name.len() {
                warn!(
                    "'{}' is shorter than '{}', padding with {} NUL byte(s)",
                    new_name,
                    old_name,
                    old_name.len() - new_name.len()
                );
            }
            let opts = PatchOptions {
                mode: if exact { PadMode::Exact } else { PadMode::NullPad },
                nul_terminated,
                dry_run,
            };
            cmd_replace(&path, &old_name, &new_name, &opts)
        }
        Command::PatchRpath {
            path,
            old_string,
            new_string,
            nul_terminated,
            dry_run,
        } => {
            let opts = PatchOptions {
                mode: PadMode::NullPad,
                nul_terminated,
                dry_run,
            };
            cmd_replace(&path, &old_string, &new_string, &opts)
        }
        Command::Inspect { path } => cmd_inspect(&path),
    }
}

fn cmd_replace(path: &Path, old: &str, new: &str, opts: &PatchOptions) -> anyhow::Result<()> {
    let result = patch::patch_file(path, old.as_bytes(), new.as_bytes(), opts)
        .with_context(|| format!("patching {}", path.display()))?;

    println!(
        "Found {} occurrence(s) of '{}' in {}",
        result.substitution.count(),
        old.cyan(),
        path.display()
    );
    println!(
        "  replacement: '{}' ({} bytes)",
        result.substitution.replacement.escape_ascii(),
        result.substitution.pattern_len
    );
    for off in &result.substitution.offsets {
        println!("  patched at offset {}", format!("0x{:x}", off).cyan());
    }
    println!("  file size: {} bytes (unchanged)", result.file_size);
    if result.written {
        println!("{}", "Done.".green());
        log_dynamic(path);
    } else {
        println!("{}", "Dry run, file not modified.".yellow());
    }
    Ok(())
}

fn cmd_force_patch(path: &Path, rules: Option<&Path>, dry_run: bool) -> anyhow::Result<()> {
    let rules = match rules {
        Some(p) => RuleSet::load(p).with_context(|| format!("loading rules {}", p.display()))?,
        None => RuleSet::default(),
    };

    // Redirecting to a library the binary does not already need adds a dependency.
    if let Ok(info) = DynamicInfo::load(path) {
        for name in rules.replacements() {
            if !info.needs(name) {
                warn!("{} does not already depend on {}", path.display(), name);
            }
        }
    }

    let result = patch::force_patch_file(path, &rules, dry_run)
        .with_context(|| format!("patching {}", path.display()))?;

    for hit in &result.hits {
        println!("Patching {} at offset {}", hit.pattern.cyan(), hit.offset);
    }
    if result.hits.is_empty() {
        println!("{}", "No target dependencies found to patch.".yellow());
    } else if result.written {
        println!("{}", "Successfully patched.".green());
        log_dynamic(path);
    } else {
        println!("{}", "Dry run, file not modified.".yellow());
    }
    Ok(())
}

fn cmd_inspect(path: &Path) -> anyhow::Result<()> {
    let info = DynamicInfo::load(path).with_context(|| format!("reading {}", path.display()))?;

    println!("{}", path.display().to_string().bold());
    match &info.soname {
        Some(s) => println!("  SONAME:  {}", s.cyan()),
        None => println!("  SONAME:  {}", "(none)".yellow()),
    }
    for n in &info.needed {
        println!("  NEEDED:  {}", n);
    }
    for r in &info.rpath {
        println!("  RPATH:   {}", r);
    }
    for r in &info.runpath {
        println!("  RUNPATH: {}", r);
    }
    Ok(())
}

fn log_dynamic(path: &Path) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    match DynamicInfo::load(path) {
        Ok(info) => debug!(
            "after patch: soname={:?} needed={:?} rpath={:?} runpath={:?}",
            info.soname, info.needed, info.rpath, info.runpath
        ),
        Err(e) => debug!("not an ELF file ({}), skipping dynamic section dump", e),
    }
}
