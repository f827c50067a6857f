//! Thin CLI wrapper around [`sassy`], gated behind the `cli` feature so
//! library consumers never pull in `structopt` (Cargo.toml's
//! `required-features = ["cli"]` on this binary). Grounded on the
//! `StructOpt`/`from_args` idiom in
//! `examples/GNOME-librsvg/src/bin/rsvg-bench.rs`: a derived `Opt`,
//! a `run` returning `SassResult`, `main` mapping its error to a
//! stderr print and nonzero exit.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use sassy::{Options, OutputStyle, SassResult};

#[derive(StructOpt, Debug)]
#[structopt(name = "sassy", about = "Compiles Sass-like stylesheets to CSS.")]
struct Opt {
    /// Stylesheet to compile. Omit, or pass `-`, to read from stdin.
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Write output here instead of stdout.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,

    /// Additional directory to search for `@import`s.
    #[structopt(short = "I", long = "load-path", parse(from_os_str))]
    load_paths: Vec<PathBuf>,

    /// Number of decimal digits to keep in non-terminating numbers.
    #[structopt(long = "precision", default_value = "5")]
    precision: usize,

    /// Suppress `@warn`/`@debug` output.
    #[structopt(short = "q", long = "quiet")]
    quiet: bool,

    #[structopt(long = "style", default_value = "nested")]
    style: StyleArg,
}

#[derive(Debug)]
struct StyleArg(OutputStyle);

impl std::str::FromStr for StyleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested" => Ok(StyleArg(OutputStyle::Nested)),
            "expanded" => Ok(StyleArg(OutputStyle::Expanded)),
            "compressed" => Ok(StyleArg(OutputStyle::Compressed)),
            "compact" => Ok(StyleArg(OutputStyle::Compact)),
            other => Err(format!("unknown output style {:?} (expected nested, expanded, compressed, or compact)", other)),
        }
    }
}

fn build_options(opt: &Opt) -> Options {
    let mut options = Options::new()
        .with_style(opt.style.0)
        .with_precision(opt.precision)
        .with_quiet(opt.quiet);
    for path in &opt.load_paths {
        options = options.with_load_path(path.clone());
    }
    options
}

fn run(opt: &Opt) -> SassResult<String> {
    let options = build_options(opt);
    match &opt.input {
        Some(path) if path.as_os_str() != "-" => sassy::compile_file(path, &options),
        _ => {
            let mut input = String::new();
            io::Read::read_to_string(&mut io::stdin(), &mut input)
                .expect("failed to read stdin");
            sassy::compile_string(input, &options)
        }
    }
}

fn main() {
    let opt = Opt::from_args();

    let css = match run(&opt) {
        Ok(css) => css,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match &opt.output {
        Some(path) => {
            if let Err(e) = fs::write(path, css) {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if handle.write_all(css.as_bytes()).is_err() {
                process::exit(1);
            }
        }
    }
}
