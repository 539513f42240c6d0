//! apigen-drv - Command line driver
//!
//! The driver wires the pipeline together for one invocation: read the
//! input (a file or stdin), parse, analyze, render to the selected
//! target, and finally dump every recorded diagnostic to stderr. The
//! exit status is zero only when no phase failed and no error-level
//! diagnostic was recorded.
//!
//! Test mode replaces rendering with an expectation check: the first
//! input line may carry a `// expected: 1007, 1010` directive, and the
//! run succeeds only when every listed code fired and nothing unexpected
//! remains.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use thiserror::Error;

use apigen_gen::{Language, RenderError};
use apigen_par::{ParseOptions, Parser};
use apigen_sem::analyze;
use apigen_util::{DiagnosticCode, Handler, Span};

const HELP_TEXT: &str = "\
apigen [-h] [-o <file>] [-l <lang>] <input file>

apigen is a tool to generate bindings and implementations for APIs that cross ABI boundaries.

Options:
   -h, --help             Shows this help text
   -o, --output <path>    Instead of printing the output to stdout, will write the output to <path>.
   -l, --language <lang>  Generates code for the given language. Valid options are: [c], c++, zig, rust, go
   -i, --implementation   Generates an implementation stub, not a binding.
   --test-mode <mode>     Compares emitted diagnostic codes against the input's expectation line.
                          Valid modes are: [disabled], parser, analyzer
";

/// Which pipeline prefix the expectation checker runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestMode {
    Disabled,
    Parser,
    Analyzer,
}

/// Parsed command line options.
#[derive(Debug)]
pub struct Options {
    pub help: bool,
    pub output: Option<PathBuf>,
    pub language: Language,
    pub implementation: bool,
    pub test_mode: TestMode,
    /// The one positional input; `-` reads stdin
    pub input: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            help: false,
            output: None,
            language: Language::C,
            implementation: false,
            test_mode: TestMode::Disabled,
            input: None,
        }
    }
}

/// Command line errors.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("error while parsing option '{option}': {message}")]
    BadOption { option: String, message: String },

    #[error("apigen requires exactly one input file")]
    BadPositionals,
}

fn bad_option(option: &str, message: &str) -> DriverError {
    DriverError::BadOption {
        option: option.to_string(),
        message: message.to_string(),
    }
}

/// Parses the command line (without the executable name).
///
/// Accepts long options with `--name value` or `--name=value`, combined
/// boolean short options (`-hi`), `--` to end option parsing, and one
/// positional input file.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, DriverError> {
    let mut queue: VecDeque<String> = args.into_iter().collect();
    let mut options = Options::default();
    let mut positionals: Vec<String> = Vec::new();
    let mut allow_options = true;

    while let Some(arg) = queue.pop_front() {
        if allow_options && arg == "--" {
            allow_options = false;
        } else if allow_options && arg.starts_with("--") {
            let body = &arg[2..];
            let (option, inline_value) = match body.split_once('=') {
                Some((option, value)) => (option.to_string(), Some(value.to_string())),
                None => (body.to_string(), None),
            };
            apply_option(&mut options, &option, inline_value, &mut queue)?;
        } else if allow_options && arg.len() > 1 && arg.starts_with('-') {
            let shorts: Vec<char> = arg[1..].chars().collect();
            for (index, short) in shorts.iter().enumerate() {
                let option = match short {
                    'h' => "help",
                    'o' => "output",
                    'l' => "language",
                    'i' => "implementation",
                    _ => {
                        return Err(bad_option(&short.to_string(), "illegal option"));
                    }
                };
                if takes_value(option) && index + 1 != shorts.len() {
                    return Err(bad_option(option, "option with value must come last"));
                }
                apply_option(&mut options, option, None, &mut queue)?;
            }
        } else {
            positionals.push(arg);
        }
    }

    if positionals.len() > 1 {
        return Err(DriverError::BadPositionals);
    }
    options.input = positionals.pop();
    if options.input.is_none() && !options.help {
        return Err(DriverError::BadPositionals);
    }
    Ok(options)
}

fn takes_value(option: &str) -> bool {
    matches!(option, "output" | "language" | "test-mode")
}

fn apply_option(
    options: &mut Options,
    option: &str,
    inline_value: Option<String>,
    queue: &mut VecDeque<String>,
) -> Result<(), DriverError> {
    let mut take_value = |message: &str| -> Result<String, DriverError> {
        inline_value
            .clone()
            .or_else(|| queue.pop_front())
            .ok_or_else(|| bad_option(option, message))
    };

    match option {
        "help" => options.help = true,
        "implementation" => options.implementation = true,
        "output" => options.output = Some(PathBuf::from(take_value("expects output file name")?)),
        "language" => {
            let value = take_value("expects language identifier")?;
            options.language =
                Language::from_name(&value).ok_or_else(|| bad_option(option, "unknown language"))?;
        }
        "test-mode" => {
            options.test_mode = match take_value("expects a test mode")?.as_str() {
                "disabled" => TestMode::Disabled,
                "parser" => TestMode::Parser,
                "analyzer" => TestMode::Analyzer,
                _ => return Err(bad_option(option, "illegal value")),
            };
        }
        _ => return Err(bad_option(option, "illegal option")),
    }
    Ok(())
}

/// Runs one invocation and returns the process exit code.
pub fn run(options: &Options) -> anyhow::Result<i32> {
    if options.help {
        print!("{HELP_TEXT}");
        return Ok(0);
    }

    let handler = Handler::new();
    let code = match options.test_mode {
        TestMode::Disabled => regular_invocation(options, &handler)?,
        TestMode::Parser | TestMode::Analyzer => test_runner(options, &handler)?,
    };

    handler
        .render_to(&mut io::stderr())
        .context("failed to render diagnostics")?;

    Ok(code)
}

fn input_file_name(input: &str) -> &str {
    if input == "-" {
        "stdin"
    } else {
        input
    }
}

fn read_source(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(input)
    }
}

fn regular_invocation(options: &Options, handler: &Handler) -> anyhow::Result<i32> {
    let Some(input) = options.input.as_deref() else {
        bail!("apigen requires exactly one input file");
    };
    let file_name = input_file_name(input);

    let source = match read_source(input) {
        Ok(source) => source,
        Err(err) => {
            handler.emit_at(
                DiagnosticCode::INTERNAL,
                file_name,
                Span::DUMMY,
                format!("could not open '{input}': {err}"),
            );
            return Ok(1);
        }
    };

    let parse_options = ParseOptions {
        file_name: file_name.to_string(),
        ..ParseOptions::default()
    };
    let parsed = Parser::new(&source, &parse_options, handler).parse();
    if !parsed.ok {
        return Ok(1);
    }

    let Ok(document) = analyze(&parsed.declarations, file_name, handler) else {
        return Ok(1);
    };

    let mut output: Box<dyn Write> = match options.output.as_deref() {
        None => Box::new(io::stdout()),
        Some(path) if path.as_os_str() == "-" => Box::new(io::stdout()),
        Some(path) => match fs::File::create(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                handler.emit_at(
                    DiagnosticCode::INTERNAL,
                    file_name,
                    Span::DUMMY,
                    format!("could not open '{}': {err}", path.display()),
                );
                return Ok(1);
            }
        },
    };

    match options.language.renderer().render(&document, &mut output) {
        Ok(()) => {}
        Err(RenderError::Unsupported(language)) => {
            handler.emit_at(
                DiagnosticCode::INTERNAL,
                file_name,
                Span::DUMMY,
                format!("the {language} backend is not implemented"),
            );
            return Ok(1);
        }
        Err(RenderError::Io(err)) => {
            handler.emit_at(
                DiagnosticCode::INTERNAL,
                file_name,
                Span::DUMMY,
                format!("could not write output: {err}"),
            );
            return Ok(1);
        }
    }

    Ok(if handler.has_errors() { 1 } else { 0 })
}

/// Reads the expectation directive from the first input line.
fn parse_expectations(source: &str) -> anyhow::Result<Vec<u32>> {
    let first_line = source.lines().next().unwrap_or("");
    let Some(list) = first_line.strip_prefix("// expected:") else {
        return Ok(Vec::new());
    };

    let mut expectations = Vec::new();
    for item in list.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let code: u32 = item
            .parse()
            .with_context(|| format!("invalid diagnostic code '{item}' in expectation line"))?;
        expectations.push(code);
    }
    Ok(expectations)
}

fn test_runner(options: &Options, handler: &Handler) -> anyhow::Result<i32> {
    let Some(input) = options.input.as_deref() else {
        bail!("apigen requires exactly one input file");
    };
    let file_name = input_file_name(input);

    let source = read_source(input).with_context(|| format!("could not open '{input}'"))?;
    let expectations = parse_expectations(&source)?;

    let parse_options = ParseOptions {
        file_name: file_name.to_string(),
        ..ParseOptions::default()
    };
    let parsed = Parser::new(&source, &parse_options, handler).parse();

    let mut ok = parsed.ok;
    if ok && options.test_mode == TestMode::Analyzer {
        ok = analyze(&parsed.declarations, file_name, handler).is_ok();
    }

    if expectations.is_empty() {
        return Ok(if ok { 0 } else { 1 });
    }

    let mut expectations_met = true;
    for code in expectations {
        if !handler.remove_one(DiagnosticCode(code)) {
            eprintln!("error: expected diagnostic code {code}, but it was not present!");
            expectations_met = false;
        }
    }
    if handler.has_any() {
        eprintln!("error: unexpected diagnostics are present!");
        return Ok(1);
    }

    Ok(if expectations_met { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(args(&["input.api"])).unwrap();
        assert_eq!(options.input.as_deref(), Some("input.api"));
        assert_eq!(options.language, Language::C);
        assert_eq!(options.test_mode, TestMode::Disabled);
        assert!(!options.help);
        assert!(options.output.is_none());
    }

    #[test]
    fn test_parse_args_long_options() {
        let options = parse_args(args(&[
            "--output",
            "out.h",
            "--language",
            "zig",
            "--implementation",
            "input.api",
        ]))
        .unwrap();
        assert_eq!(options.output.as_deref(), Some(std::path::Path::new("out.h")));
        assert_eq!(options.language, Language::Zig);
        assert!(options.implementation);
    }

    #[test]
    fn test_parse_args_equals_form() {
        let options = parse_args(args(&["--language=c++", "input.api"])).unwrap();
        assert_eq!(options.language, Language::Cpp);
    }

    #[test]
    fn test_parse_args_test_mode() {
        let options = parse_args(args(&["--test-mode", "analyzer", "input.api"])).unwrap();
        assert_eq!(options.test_mode, TestMode::Analyzer);
        let options = parse_args(args(&["--test-mode=parser", "input.api"])).unwrap();
        assert_eq!(options.test_mode, TestMode::Parser);
    }

    #[test]
    fn test_parse_args_short_options() {
        let options = parse_args(args(&["-i", "-o", "out.h", "input.api"])).unwrap();
        assert!(options.implementation);
        assert_eq!(options.output.as_deref(), Some(std::path::Path::new("out.h")));
    }

    #[test]
    fn test_parse_args_combined_booleans() {
        let options = parse_args(args(&["-hi"])).unwrap();
        assert!(options.help);
        assert!(options.implementation);
    }

    #[test]
    fn test_parse_args_stdin_positional() {
        let options = parse_args(args(&["-"])).unwrap();
        assert_eq!(options.input.as_deref(), Some("-"));
    }

    #[test]
    fn test_parse_args_double_dash() {
        let options = parse_args(args(&["--", "--language"])).unwrap();
        assert_eq!(options.input.as_deref(), Some("--language"));
    }

    #[test]
    fn test_parse_args_rejects_unknown_option() {
        assert!(parse_args(args(&["--frobnicate", "input.api"])).is_err());
        assert!(parse_args(args(&["-q", "input.api"])).is_err());
    }

    #[test]
    fn test_parse_args_rejects_unknown_language() {
        assert!(parse_args(args(&["--language", "cobol", "input.api"])).is_err());
    }

    #[test]
    fn test_parse_args_requires_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.api", "b.api"])).is_err());
    }

    #[test]
    fn test_parse_args_help_without_input() {
        let options = parse_args(args(&["--help"])).unwrap();
        assert!(options.help);
        assert!(options.input.is_none());
    }

    #[test]
    fn test_parse_expectations() {
        let codes = parse_expectations("// expected: 1007, 1010\ntype A = u8;").unwrap();
        assert_eq!(codes, vec![1007, 1010]);
    }

    #[test]
    fn test_parse_expectations_absent() {
        let codes = parse_expectations("type A = u8;").unwrap();
        assert!(codes.is_empty());
    }

    #[test]
    fn test_parse_expectations_rejects_garbage() {
        assert!(parse_expectations("// expected: banana").is_err());
    }

    #[test]
    fn test_input_file_name() {
        assert_eq!(input_file_name("-"), "stdin");
        assert_eq!(input_file_name("lib.api"), "lib.api");
    }
}
