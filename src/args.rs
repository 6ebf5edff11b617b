//! Code to parse the command line using `clap`, and definitions of the
//! parsed result. The `-d`, `-t`, and `-e` options are positional: each
//! governs the files named after it, so two inputs can be split under
//! different delimiters. `clap` collects the options and the argv index of
//! every occurrence; `args_from` replays those indices to work out which
//! options were in force at each file's position.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, ensure, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::expr::{self, Expr};
use crate::help;
use crate::record::BLANK;
use crate::style::ColorChoice;

/// The parsed command line.
#[derive(Debug)]
pub struct Args {
    /// The compiled expression to evaluate.
    pub expression: Expr,
    /// The inputs the expression's letters refer to, in `A`, `B`, ... order.
    pub inputs: Vec<Input>,
    /// Bytes placed between output columns.
    pub output_separator: Vec<u8>,
    /// Dump the parsed tree to stderr before evaluating.
    pub show_tree: bool,
}

/// One input file, plus the positional options in force at its place on the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// The file's path, or `-` for standard input.
    pub path: PathBuf,
    /// The bytes that separate columns.
    pub delimiters: Vec<u8>,
    /// Trim blanks from each end of every column.
    pub trim: bool,
    /// Keep zero-length columns instead of dropping them.
    pub keep_empty: bool,
}

/// Returns the parsed command line. Prints help or the version and exits 0
/// when `-h` or `-V` is given; exits 1 on a usage error.
pub fn parsed() -> Result<Args> {
    let matches = match command().try_get_matches_from(env::args_os()) {
        Ok(matches) => matches,
        Err(err) => {
            // Usage problems exit 1 like every other failure, not clap's
            // default 2.
            let _ = err.print();
            process::exit(1);
        }
    };
    if matches.get_flag("help") {
        let color = match matches.get_one::<String>("color").map(String::as_str) {
            Some("always") => ColorChoice::Always,
            Some("never") => ColorChoice::Never,
            _ => ColorChoice::Auto,
        };
        help::print(color)?;
        process::exit(0);
    }
    if matches.get_flag("version") {
        println!("{}", help::version());
        process::exit(0);
    }
    args_from(&matches)
}

fn command() -> Command {
    Command::new("rowset")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(Arg::new("help").short('h').long("help").action(ArgAction::SetTrue))
        .arg(Arg::new("version").short('V').long("version").action(ArgAction::SetTrue))
        .arg(
            Arg::new("delimiters")
                .short('d')
                .long("delimiters")
                .value_name("SET")
                .action(ArgAction::Append),
        )
        // Appended rather than set, so a repeated `-D` is last-wins
        // instead of a conflict error.
        .arg(
            Arg::new("output-separator")
                .short('D')
                .long("output-separator")
                .value_name("SEP")
                .action(ArgAction::Append),
        )
        // Every `-t` and `-e` occurrence must keep its argv index, and
        // `SetTrue` and `Count` record only the last one. Appending a
        // defaulted missing value records one index per occurrence, and
        // `require_equals` keeps a bare flag from eating the next file.
        .arg(
            Arg::new("no-trim")
                .short('t')
                .long("no-trim")
                .action(ArgAction::Append)
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["on"])
                .default_missing_value("on"),
        )
        .arg(
            Arg::new("keep-empty")
                .short('e')
                .long("keep-empty")
                .action(ArgAction::Append)
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["on"])
                .default_missing_value("on"),
        )
        .arg(Arg::new("show-tree").short('v').long("show-tree").action(ArgAction::SetTrue))
        .arg(
            Arg::new("color")
                .long("color")
                .value_name("WHEN")
                .value_parser(["auto", "always", "never"])
                .default_value("auto"),
        )
        .arg(Arg::new("expression").value_name("EXPR"))
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append),
        )
}

fn args_from(matches: &ArgMatches) -> Result<Args> {
    let Some(expression) = matches.get_one::<String>("expression") else {
        bail!("no expression to evaluate (rowset -h shows an example)");
    };
    let paths: Vec<&PathBuf> = matches.get_many("files").into_iter().flatten().collect();
    let positions: Vec<usize> = matches.indices_of("files").into_iter().flatten().collect();
    ensure!(!paths.is_empty(), "no input files named (rowset -h shows an example)");
    ensure!(
        paths.len() <= 26,
        "only 26 inputs (A through Z) can be named, not {}",
        paths.len()
    );

    let delimiters_at: Vec<(usize, &String)> = occurrences(matches, "delimiters");
    let no_trim_at: Vec<usize> = matches.indices_of("no-trim").into_iter().flatten().collect();
    let keep_empty_at: Vec<usize> =
        matches.indices_of("keep-empty").into_iter().flatten().collect();

    let inputs: Vec<Input> = paths
        .iter()
        .zip(&positions)
        .map(|(path, &position)| {
            let delimiters = delimiters_at
                .iter()
                .take_while(|(at, _)| *at < position)
                .last()
                .map_or(BLANK, |(_, set)| set.as_bytes())
                .to_vec();
            Input {
                path: (*path).clone(),
                delimiters,
                trim: !no_trim_at.iter().any(|at| *at < position),
                keep_empty: keep_empty_at.iter().any(|at| *at < position),
            }
        })
        .collect();

    let expression = expr::parse(expression, inputs.len())?;
    let output_separator = matches
        .get_many::<String>("output-separator")
        .and_then(Iterator::last)
        .map_or_else(|| b",".to_vec(), |sep| sep.as_bytes().to_vec());
    Ok(Args {
        expression,
        inputs,
        output_separator,
        show_tree: matches.get_flag("show-tree"),
    })
}

// The values of a repeatable option, each paired with its argv index.
fn occurrences<'a>(matches: &'a ArgMatches, id: &str) -> Vec<(usize, &'a String)> {
    match (matches.indices_of(id), matches.get_many::<String>(id)) {
        (Some(indices), Some(values)) => indices.zip(values).collect(),
        _ => Vec::new(),
    }
}
