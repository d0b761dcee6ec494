//! GraphQL Operations CLI
//!
//! Command-line interface for compiling operations and validating variables.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use graphql_operations::{
    directive_definitions_sdl, load_compiled_operations, load_operations_dir,
    load_operations_json, load_schema_sdl, load_variables, parse_graphql_operations, Audience,
    CompileOptions, LoadOperationsOutput, ValidateError,
};

const DEFAULT_LOG_LEVEL: tracing::Level = tracing::Level::INFO;

#[derive(Parser)]
#[command(name = "graphql-operations")]
#[command(about = "Compile annotated GraphQL operations into JSON Schema and runtime configuration")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile operations against a schema
    Compile {
        /// GraphQL schema (SDL) file
        #[arg(long)]
        schema: PathBuf,

        /// Directory of *.graphql operation files
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        operations: Option<PathBuf>,

        /// Directory of shared fragment files
        #[arg(long, requires = "operations")]
        fragments: Option<PathBuf>,

        /// Loader output JSON (instead of --operations)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Compiler configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Fail if any operation file was skipped
        #[arg(long)]
        strict: bool,
    },

    /// Validate a variables payload against a compiled operation
    Validate {
        /// Variables payload file
        payload: PathBuf,

        /// Compiled operations file (output of `compile`)
        #[arg(long)]
        operations: PathBuf,

        /// Operation name
        #[arg(long)]
        operation: String,

        /// Schema variant: public, internal or injected
        #[arg(long, default_value = "public")]
        audience: Audience,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Print the directive definitions merged into every schema
    Directives {
        /// Compiler configuration JSON (roles, custom claims)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(&cli);

    let result = match cli.command {
        Commands::Compile {
            schema,
            operations,
            fragments,
            input,
            config,
            output,
            pretty,
            strict,
        } => run_compile(CompileArgs {
            schema,
            operations,
            fragments,
            input,
            config,
            output,
            pretty,
            strict,
        }),
        Commands::Validate {
            payload,
            operations,
            operation,
            audience,
            json,
        } => run_validate(&payload, &operations, &operation, audience, json),
        Commands::Directives { config } => run_directives(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn setup_logger(cli: &Cli) {
    let mut warnings: Vec<String> = vec![];
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match std::env::var("LOG_LEVEL").map(|s| s.trim().to_lowercase()).as_deref() {
            Ok("trace") => tracing::Level::TRACE,
            Ok("debug") => tracing::Level::DEBUG,
            Ok("info") => tracing::Level::INFO,
            Ok("warn") => tracing::Level::WARN,
            Ok("error") => tracing::Level::ERROR,
            Ok(other) => {
                warnings.push(format!("Invalid `LOG_LEVEL` environment variable value: `{other}`"));
                DEFAULT_LOG_LEVEL
            }
            Err(_) => DEFAULT_LOG_LEVEL,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    for warning in warnings {
        tracing::warn!("{warning}");
    }
}

fn load_options(config: Option<&Path>) -> Result<CompileOptions, u8> {
    match config {
        Some(path) => CompileOptions::from_file(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        }),
        None => Ok(CompileOptions::new()),
    }
}

struct CompileArgs {
    schema: PathBuf,
    operations: Option<PathBuf>,
    fragments: Option<PathBuf>,
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    pretty: bool,
    strict: bool,
}

fn run_compile(args: CompileArgs) -> Result<(), u8> {
    let options = load_options(args.config.as_deref())?;

    let sdl = load_schema_sdl(&args.schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let input: LoadOperationsOutput = match (&args.operations, &args.input) {
        (Some(dir), _) => load_operations_dir(dir, args.fragments.as_deref()),
        (None, Some(path)) => load_operations_json(path),
        (None, None) => {
            eprintln!("Error: either --operations or --input is required");
            return Err(2);
        }
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for line in &input.info {
        tracing::info!("{line}");
    }
    for line in &input.errors {
        tracing::error!("{line}");
    }

    let parsed = parse_graphql_operations(&sdl, &input, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if args.pretty {
        serde_json::to_string_pretty(&parsed)
    } else {
        serde_json::to_string(&parsed)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    tracing::info!(
        operations = parsed.operations.len(),
        failures = parsed.failures.len(),
        "compilation finished"
    );
    if args.strict && !parsed.failures.is_empty() {
        eprintln!("Error: {} operation file(s) failed to compile", parsed.failures.len());
        for failure in &parsed.failures {
            eprintln!("  {}: {}", failure.file_path, failure.message);
        }
        return Err(1);
    }
    Ok(())
}

fn run_validate(
    payload_path: &Path,
    operations_path: &Path,
    operation_name: &str,
    audience: Audience,
    json_output: bool,
) -> Result<(), u8> {
    let payload = load_variables(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let compiled = load_compiled_operations(operations_path).map_err(|e| {
        report_error(json_output, &format!("loading operations: {}", e));
        e.exit_code() as u8
    })?;

    let Some(operation) = compiled.operation(operation_name) else {
        let e = ValidateError::UnknownOperation {
            name: operation_name.to_string(),
        };
        report_error(json_output, &e.to_string());
        return Err(e.exit_code() as u8);
    };

    match graphql_operations::validate_variables(operation, &payload, audience) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_directives(config: Option<&Path>) -> Result<(), u8> {
    let options = load_options(config)?;
    println!("{}", directive_definitions_sdl(&options));
    Ok(())
}
