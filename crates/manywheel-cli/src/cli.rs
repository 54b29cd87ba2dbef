use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const MANYWHEEL_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const MANYWHEEL_BEFORE_HELP: &str = concat!(
    "manywheel ",
    env!("CARGO_PKG_VERSION"),
    " – manylinux wheel builder\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  build            Install build deps, build wheels, repair them into the output dir.\n",
    "  python-path      Print the interpreter directory for a Python version and width.\n",
    "  lex-ver          Print the fixed-width, comparable encoding of a version.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "manywheel",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = MANYWHEEL_BEFORE_HELP,
    help_template = MANYWHEEL_HELP_TEMPLATE
)]
pub struct ManywheelCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Build manylinux wheels for the source tree and repair them into the output dir.",
        override_usage = "manywheel build [--python-version VERSION] [--build-depends \"DEPS\"] [--dry-run]",
        after_help = "Examples:\n  PYTHON_VERSION=2.7 UNICODE_WIDTH=16 manywheel build\n  manywheel build --python-version 3.6 --build-depends \"numpy cython\" --source /io"
    )]
    Build(BuildArgs),
    #[command(
        about = "Print the interpreter directory for a Python version and unicode width.",
        override_usage = "manywheel python-path [VERSION] [--width 16|32]",
        after_help = "Examples:\n  manywheel python-path 2.7 --width 16   # /opt/python/cp27-cp27m\n  manywheel python-path 3.6              # /opt/python/cp36-cp36m"
    )]
    PythonPath(PythonPathArgs),
    #[command(
        about = "Print the zero-padded encoding of a dotted version (3.2.1 -> 003002001).",
        override_usage = "manywheel lex-ver <VERSION>"
    )]
    LexVer(LexVerArgs),
}

#[derive(Args, Debug)]
pub struct LexVerArgs {
    #[arg(value_name = "VERSION", help = "Dotted version with at most three components")]
    pub version: String,
}

#[derive(Args, Debug)]
pub struct PythonPathArgs {
    #[arg(
        value_name = "VERSION",
        help = "Python version (major.minor) [env: PYTHON_VERSION, default: 2.7]"
    )]
    pub version: Option<String>,
    #[arg(
        long,
        value_name = "WIDTH",
        help = "Unicode width of Python 2 / 3.0-3.2 builds: 16 or 32 [env: UNICODE_WIDTH]"
    )]
    pub width: Option<String>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory holding the cpXY-cpXYm[u] interpreters [env: MANYWHEEL_PYTHON_ROOT]"
    )]
    pub root: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Source tree to build [env: MANYWHEEL_SOURCE, default: /io]"
    )]
    pub source: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Where repaired wheels land [env: MANYWHEEL_OUT, default: <source>/dist]"
    )]
    pub out: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Keep unrepaired wheels here instead of a temporary directory"
    )]
    pub work_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "VERSION",
        help = "Python version to build for [env: PYTHON_VERSION, required]"
    )]
    pub python_version: Option<String>,
    #[arg(
        long,
        value_name = "WIDTH",
        help = "Unicode width of Python 2 / 3.0-3.2 builds: 16 or 32 [env: UNICODE_WIDTH]"
    )]
    pub unicode_width: Option<String>,
    #[arg(
        long,
        value_name = "DEPS",
        help = "Space separated packages to pip install before building [env: BUILD_DEPENDS]"
    )]
    pub build_depends: Option<String>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory holding the cpXY-cpXYm[u] interpreters [env: MANYWHEEL_PYTHON_ROOT]"
    )]
    pub python_root: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PROGRAM",
        help = "auditwheel executable used for repair [env: MANYWHEEL_AUDITWHEEL]"
    )]
    pub auditwheel: Option<String>,
    #[arg(long, help = "Show the commands without running them")]
    pub dry_run: bool,
}
