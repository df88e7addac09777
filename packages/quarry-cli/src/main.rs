//! Command line interface for the quarry JSONPath engine.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

use quarry::{Environment, JsonPatch, JsonPointer};

#[derive(Parser)]
#[command(
    name = "quarry",
    version,
    about = "JSONPath queries, JSON Pointer resolution and JSON Patch application"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable compile-time well-typedness checks of filter
    /// expressions.
    #[arg(long, global = true)]
    no_type_checks: bool,

    /// Disable decoding of UTF-16 escape sequences in queries and
    /// pointers.
    #[arg(long, global = true)]
    no_unicode_escape: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Find values matching a JSONPath query.
    Path {
        /// The JSONPath query string.
        #[arg(short, long)]
        query: String,

        /// Input JSON file. Reads from stdin when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve an RFC 6901 JSON Pointer.
    Pointer {
        /// The pointer string.
        #[arg(short, long)]
        pointer: String,

        /// Input JSON file. Reads from stdin when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Percent-decode the pointer before parsing it.
        #[arg(short, long)]
        uri_decode: bool,
    },
    /// Apply an RFC 6902 patch document.
    Patch {
        /// File holding the patch document: a JSON array of
        /// operations.
        #[arg(short, long)]
        patch: PathBuf,

        /// Input JSON file. Reads from stdin when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("quarry: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Command::Path {
            query,
            file,
            output,
        } => {
            let data = read_input(file.as_deref())?;
            let env = Environment::builder()
                .well_typed(!cli.no_type_checks)
                .unicode_escape(!cli.no_unicode_escape)
                .build();
            let values = env
                .findall(query, &data)
                .map_err(|err| err.to_string())?;
            write_output(output.as_deref(), &Value::Array(values), cli.pretty)
        }
        Command::Pointer {
            pointer,
            file,
            output,
            uri_decode,
        } => {
            let data = read_input(file.as_deref())?;
            let pointer =
                JsonPointer::parse_opts(pointer, !cli.no_unicode_escape, *uri_decode)
                    .map_err(|err| err.to_string())?;
            let resolved = pointer.resolve(&data).map_err(|err| err.to_string())?;
            write_output(output.as_deref(), resolved.as_ref(), cli.pretty)
        }
        Command::Patch {
            patch,
            file,
            output,
        } => {
            let data = read_input(file.as_deref())?;
            let doc = read_json(patch)?;
            let patch = JsonPatch::from_value(&doc).map_err(|err| err.to_string())?;
            let result = patch.apply(&data).map_err(|err| err.to_string())?;
            write_output(output.as_deref(), &result, cli.pretty)
        }
    }
}

fn read_input(file: Option<&Path>) -> Result<Value, String> {
    match file {
        Some(path) => read_json(path),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("stdin: {err}"))?;
            serde_json::from_str(&text).map_err(|err| format!("stdin: {err}"))
        }
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let file = File::open(path).map_err(|err| format!("{}: {err}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("{}: {err}", path.display()))
}

fn write_output(path: Option<&Path>, value: &Value, pretty: bool) -> Result<(), String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| err.to_string())?;

    match path {
        Some(path) => {
            let file = File::create(path).map_err(|err| format!("{}: {err}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{rendered}").map_err(|err| format!("{}: {err}", path.display()))
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
