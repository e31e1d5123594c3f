use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use cjit_rt::LaunchConfig;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cjit", version)]
#[command(about = "Compile a C source file in memory and run its main function", long_about = None)]
pub struct Args {
    /// C source file to run
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Arguments passed to the program (use `--` before ones starting with a dash)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub program_args: Vec<OsString>,

    /// Add a header search path
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include: Vec<PathBuf>,

    /// Add a library search path
    #[arg(short = 'L', long = "lib-path", value_name = "DIR")]
    pub lib_path: Vec<PathBuf>,

    /// Directory the temporary workspace is created in
    #[arg(long, value_name = "DIR", env = "CJIT_TMPDIR")]
    pub tmpdir: Option<PathBuf>,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Args {
    /// Folds the command line into the configuration of a single launch.
    pub fn launch_config(&self) -> LaunchConfig {
        let mut config = LaunchConfig::new(&self.file).with_program_args(self.program_args.iter().cloned());
        for dir in &self.include {
            config = config.with_include_path(dir);
        }
        for dir in &self.lib_path {
            config = config.with_library_path(dir);
        }
        if let Some(root) = &self.tmpdir {
            config = config.with_workspace_root(root);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("cjit").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn file_and_program_args() {
        let args = parse(&["hello.c", "one", "two"]);
        assert_eq!(args.file, PathBuf::from("hello.c"));
        assert_eq!(args.program_args, vec![OsString::from("one"), OsString::from("two")]);

        let config = args.launch_config();
        assert_eq!(config.source_path(), Path::new("hello.c"));
        assert_eq!(config.argv(), vec![OsString::from("hello.c"), "one".into(), "two".into()]);
    }

    #[test]
    fn dashed_program_args_after_separator() {
        let args = parse(&["hello.c", "--", "-x", "--flag"]);
        assert_eq!(args.program_args, vec![OsString::from("-x"), OsString::from("--flag")]);
    }

    #[test]
    fn search_paths_keep_their_order() {
        let args = parse(&["-I", "/a", "--include", "/b", "-L", "/lib1", "--lib-path=/lib2", "x.c"]);
        let config = args.launch_config();
        assert_eq!(config.include_paths(), [PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(config.library_paths(), [PathBuf::from("/lib1"), PathBuf::from("/lib2")]);
    }

    #[test]
    fn tmpdir_flag_selects_workspace_root() {
        let args = parse(&["--tmpdir", "/var/tmp", "x.c"]);
        assert_eq!(args.launch_config().workspace_root(), Path::new("/var/tmp"));
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(parse(&["x.c"]).verbose.log_level_filter(), log::LevelFilter::Info);
        assert_eq!(parse(&["-v", "x.c"]).verbose.log_level_filter(), log::LevelFilter::Debug);
        assert_eq!(parse(&["-q", "x.c"]).verbose.log_level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn file_is_required() {
        let err = Args::try_parse_from(["cjit"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
