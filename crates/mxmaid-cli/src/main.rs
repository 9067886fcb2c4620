use mxmaid_core::{ConvertOptions, Converter, DiagramModel, Direction};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Convert(mxmaid_core::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Convert(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mxmaid_core::Error> for CliError {
    fn from(value: mxmaid_core::Error) -> Self {
        Self::Convert(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Convert,
    Pages,
    Model,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    strict: bool,
    page_index: usize,
    direction: Direction,
    kind: Option<String>,
}

fn usage() -> &'static str {
    "mxmaid-cli\n\
\n\
USAGE:\n\
  mxmaid-cli [convert] [--index <n>] [--direction TD|LR|RL|BT] [--kind <kind>] [--strict] [<path>|-]\n\
  mxmaid-cli pages [--strict] [<path>|-]\n\
  mxmaid-cli model [--pretty] [--index <n>] [--strict] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - convert prints Mermaid flowchart text; model prints the page's structural\n\
    model as JSON; pages prints the number of diagram pages found.\n\
  - Without --strict, undecodable fragments and unparseable pages degrade to\n\
    partial or empty output instead of failing.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "convert" => args.command = Command::Convert,
            "pages" => args.command = Command::Pages,
            "model" => args.command = Command::Model,
            "--pretty" => args.pretty = true,
            "--strict" => args.strict = true,
            "--index" => {
                let Some(index) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.page_index = index.parse::<usize>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--direction" => {
                let Some(direction) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.direction = direction
                    .parse::<Direction>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--kind" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.kind = Some(kind.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let converter = if args.strict {
        Converter::strict()
    } else {
        Converter::relaxed()
    };

    match args.command {
        Command::Convert => {
            let options = ConvertOptions {
                page_index: args.page_index,
                direction: args.direction,
                kind: args
                    .kind
                    .unwrap_or_else(|| ConvertOptions::default().kind),
            };
            let mermaid = converter.convert(&text, &options)?;
            println!("{mermaid}");
            Ok(())
        }
        Command::Pages => {
            let pages = converter.extract_pages(&text)?;
            println!("{}", pages.len());
            Ok(())
        }
        Command::Model => {
            let pages = converter.extract_pages(&text)?;
            if pages.is_empty() {
                if converter.is_strict() {
                    return Err(mxmaid_core::Error::NoPages.into());
                }
                return write_json(&DiagramModel::default(), args.pretty);
            }

            let mut index = args.page_index;
            if index >= pages.len() {
                if converter.is_strict() {
                    return Err(mxmaid_core::Error::PageIndex {
                        index,
                        pages: pages.len(),
                    }
                    .into());
                }
                index = 0;
            }
            let model = converter.build_model(&pages[index])?;
            write_json(&model, args.pretty)
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Convert(mxmaid_core::Error::NoPages)) => {
            eprintln!("{}", mxmaid_core::Error::NoPages);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
