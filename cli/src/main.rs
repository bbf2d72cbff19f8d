use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use constrained_option_core::{
    CommandSchema, ConfigError, Invocation, PromptRequest, Prompter, ResolveError, Resolver,
    SchemaConfig, ValueType, validate_schema,
};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for errors the user can fix by changing the invocation.
const EXIT_USAGE: i32 = 2;
/// Exit status for everything else.
const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Parser)]
#[command(name = "constrained-option")]
#[command(about = "Resolve command-line options against a constraint schema")]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve option arguments and print the resulting values as JSON.
    Check(CheckArgs),
    /// Report every problem in a schema file.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema file (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
    /// Option arguments to resolve, e.g. `-- --a=0 --b 1 --flag`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema file (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("{0}")]
    Usage(String),
    #[error("schema '{path}' is invalid:\n{details}")]
    InvalidSchema { path: String, details: String },
    #[error("failed to serialize resolved options: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Resolve(err) if err.is_usage_error() => EXIT_USAGE,
            CliError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Prompts on stderr and reads one line per answer.
struct StdioPrompter<R> {
    input: R,
}

impl<R: BufRead> Prompter for StdioPrompter<R> {
    fn prompt(&mut self, request: &PromptRequest) -> io::Result<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{}: ", request.text)?;
        stderr.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no input left to answer the prompt",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let schema = SchemaConfig::load(&args.schema)?.into_schema()?;
    debug!(schema = %args.schema.display(), command = %schema.name, "loaded schema");

    let invocation = tokenize(&schema, &args.args)?;
    let mut prompter = StdioPrompter {
        input: io::stdin().lock(),
    };
    let snapshot = Resolver::new(&schema).run(invocation, &mut prompter)?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let config = SchemaConfig::load(&args.schema)?;
    let schema = config.builder()?.build_unchecked();
    let errors = validate_schema(&schema);

    if !errors.is_empty() {
        return Err(CliError::InvalidSchema {
            path: args.schema.display().to_string(),
            details: errors
                .iter()
                .map(|err| format!("  - {err}"))
                .collect::<Vec<_>>()
                .join("\n"),
        });
    }

    println!(
        "Schema '{}' is valid: {} option(s), {} group(s).",
        schema.name,
        schema.options().len(),
        schema.groups().len()
    );
    Ok(())
}

/// Splits `--name=value`, `--name value` and bare `--flag` tokens.
///
/// A bare token is a flag when the option is boolean or undeclared; the
/// resolver reports undeclared names.
fn tokenize(schema: &CommandSchema, args: &[String]) -> Result<Invocation, CliError> {
    let mut invocation = Invocation::new();
    let mut tokens = args.iter();

    while let Some(token) = tokens.next() {
        let Some(body) = token.strip_prefix("--").filter(|b| !b.is_empty()) else {
            return Err(CliError::Usage(format!("unexpected argument '{token}'")));
        };

        if let Some((name, value)) = body.split_once('=') {
            invocation.insert(name, value);
            continue;
        }

        let takes_value = schema
            .option(body)
            .is_some_and(|option| option.value_type != ValueType::Boolean);
        if !takes_value {
            invocation.insert(body, true);
            continue;
        }

        match tokens.next() {
            Some(value) => invocation.insert(body, value.as_str()),
            None => {
                return Err(CliError::Usage(format!(
                    "option '--{body}' requires a value"
                )));
            }
        }
    }

    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use constrained_option_core::{OptionSchema, Value};

    fn schema() -> CommandSchema {
        CommandSchema::builder("cli")
            .option(OptionSchema::new("a"))
            .option(OptionSchema::new("dry_run").with_type(ValueType::Boolean))
            .build()
            .unwrap()
    }

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_forms() {
        let invocation = tokenize(&schema(), &args(&["--a", "0", "--dry_run"])).unwrap();
        assert_eq!(invocation.get("a"), Some(&Value::from("0")));
        assert_eq!(invocation.get("dry_run"), Some(&Value::Bool(true)));

        let invocation = tokenize(&schema(), &args(&["--a=x=y"])).unwrap();
        assert_eq!(invocation.get("a"), Some(&Value::from("x=y")));
    }

    #[test]
    fn test_tokenize_errors_are_usage_errors() {
        let err = tokenize(&schema(), &args(&["--a"])).unwrap_err();
        assert_eq!(err.to_string(), "option '--a' requires a value");
        assert_eq!(err.exit_code(), EXIT_USAGE);

        let err = tokenize(&schema(), &args(&["stray"])).unwrap_err();
        assert_eq!(err.to_string(), "unexpected argument 'stray'");
    }

    #[test]
    fn test_undeclared_bare_token_is_left_to_the_resolver() {
        let invocation = tokenize(&schema(), &args(&["--zz"])).unwrap();
        assert_eq!(invocation.get("zz"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_stdio_prompter_strips_line_ending() {
        let mut prompter = StdioPrompter {
            input: io::Cursor::new("1\r\n2\n"),
        };
        let request = PromptRequest {
            option: "b".into(),
            text: "B".into(),
            value_type: ValueType::Text,
        };
        assert_eq!(prompter.prompt(&request).unwrap(), "1");
        assert_eq!(prompter.prompt(&request).unwrap(), "2");
        assert_eq!(
            prompter.prompt(&request).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }
}
