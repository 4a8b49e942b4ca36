//! The top-level command: `Run`, the sole [`Subcommand`] this engine exposes — there
//! is no sub-command tree, since the whole program is one verb (explore a design).
//! Grounded in `commands/help.rs`'s `impl Subcommand<()> for Help`, the one current
//! `cliproc` command in the teacher that takes no outer [`Context`].

use std::path::PathBuf;

use cliproc::{cli, proc, stage::*};
use cliproc::{Arg, Cli, Help, Subcommand};

use crate::config::Config;
use crate::design::{Design, JsonLoader, Loader};
use crate::engine;
use crate::error::{Error, Result};
use crate::filelist;

const HELP: &str = "\
Bounded symbolic execution of an elaborated SystemVerilog design.

Usage:
    orbitsym [options] <num-cycles> <source-file>...

Args:
    <num-cycles>        number of clock cycles to explore per instance
    <source-file>...    elaborated design JSON files, or .F filelists naming them

Options:
    --top <unit>            top module name (default: \"top\")
    --include, -I <path>    add an include directory (repeatable)
    --define, -D <define>   add a preprocessor define (repeatable)
    --sv                    treat sources as raw SystemVerilog (unsupported in this build)
    --use_cache <path>      load/persist the guard-satisfiability cache at <path>
    --explore_time <secs>   abort exploration after this many seconds
    -B, --debug             enable debug-level logging

Use 'ORBITSYM_LOG' to set a tracing log level directly (overrides --debug).
";

#[derive(Debug)]
pub struct Run {
    num_cycles: usize,
    sources: Vec<String>,
    includes: Vec<String>,
    defines: Vec<String>,
    top: Option<String>,
    sv: bool,
    use_cache: Option<String>,
    explore_time: Option<u64>,
    debug: bool,
}

impl Subcommand<()> for Run {
    fn interpret<'c>(cli: &'c mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Run {
            sv: cli.check(Arg::flag("sv"))?,
            debug: cli.check(Arg::flag("debug").switch('B'))?,
            top: cli.get(Arg::option("top").value("unit"))?,
            use_cache: cli.get(Arg::option("use_cache").value("path"))?,
            explore_time: cli.get(Arg::option("explore_time").value("secs"))?,
            includes: cli.get_all(Arg::option("include").value("path").switch('I'))?.unwrap_or_default(),
            defines: cli.get_all(Arg::option("define").value("define").switch('D'))?.unwrap_or_default(),
            num_cycles: cli.require(Arg::positional("num-cycles"))?,
            sources: cli.get_all(Arg::positional("source-file"))?.unwrap_or_default(),
        })
    }

    fn execute(self, _: &()) -> proc::Result {
        init_logging(self.debug);

        if self.sources.is_empty() {
            Err(Error::NoSourceFiles)?;
        }
        let expanded = filelist::expand(&self.sources)?;
        if expanded.sources.is_empty() {
            Err(Error::NoSourceFiles)?;
        }

        if self.sv {
            Err(Error::Custom(
                "raw SystemVerilog input requires an external elaborator not implemented in this build; \
                 pass elaborated design JSON instead"
                    .to_string(),
            ))?;
        }

        let top = self.top.unwrap_or_else(|| "top".to_string());
        let design = load_and_merge(&expanded.sources, &top)?;

        let mut includes = self.includes;
        includes.extend(expanded.includes);
        let mut defines = self.defines;
        defines.extend(expanded.defines);

        let config = Config {
            num_cycles: self.num_cycles,
            top,
            includes,
            defines,
            use_sv: self.sv,
            cache_path: self.use_cache.map(PathBuf::from),
            explore_time: self.explore_time,
            debug: self.debug,
        };

        let report = engine::run(&design, &config)?;
        print!("{}", report.diagnostics.report());
        println!(
            "combinations explored: {} ({} abandoned)",
            report.combos_explored, report.combos_abandoned
        );

        if report.diagnostics.has_violations() {
            Err(Error::Custom("one or more assertion violations found".to_string()))?;
        }
        Ok(())
    }
}

/// Loads each non-filelist source as a [`Design`] JSON document and merges their
/// module maps, with the last file's `top` instance taking precedence — the stand-in
/// for multi-file elaborated-design delivery until a real front-end supplies one tree
/// directly.
fn load_and_merge(sources: &[PathBuf], top: &str) -> Result<Design> {
    let mut merged: Option<Design> = None;
    for source in sources {
        if !source.exists() {
            return Err(Error::SourceNotFound(source.clone()));
        }
        let design = JsonLoader::new(source).load(top)?;
        merged = Some(match merged {
            None => design,
            Some(mut acc) => {
                acc.modules.extend(design.modules);
                acc.top = design.top;
                acc
            }
        });
    }
    merged.ok_or(Error::NoSourceFiles)
}

/// Initializes `tracing-subscriber`'s env-filter, honoring `ORBITSYM_LOG` over `-B`.
fn init_logging(debug: bool) {
    use tracing_subscriber::EnvFilter;
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("ORBITSYM_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
