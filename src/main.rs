use clap::{Parser, Subcommand};
use searchq::cli::{self, CliError, CompileOptions, FieldsOptions};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "searchq")]
#[command(about = "Compile Django-style field lookups into MongoDB Atlas Search operators")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON object of lookups into search operator fragments
    Compile {
        /// Lookups as a JSON object (reads from stdin if not provided)
        lookups: Option<String>,

        /// Path to a search index definition JSON file
        #[arg(short, long)]
        index: Option<String>,

        /// Search index name, used in error messages
        #[arg(short, long, default_value = "default")]
        name: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the paths a search index definition covers
    Fields {
        /// Path to a search index definition JSON file
        #[arg(short, long)]
        index: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            lookups,
            index,
            name,
            pretty,
        } => run_compile(lookups, index, name, pretty),
        Commands::Fields { index } => run_fields(index),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_compile(
    lookups: Option<String>,
    index: Option<String>,
    name: String,
    pretty: bool,
) -> Result<(), CliError> {
    let lookups = match lookups {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };
    let definition = match index {
        Some(path) => Some(std::fs::read_to_string(path).map_err(CliError::Io)?),
        None => None,
    };

    let options = CompileOptions {
        lookups,
        definition,
        index_name: name,
    };
    let output = cli::execute_compile(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .unwrap();
    println!("{}", json);
    Ok(())
}

fn run_fields(index: String) -> Result<(), CliError> {
    let definition = std::fs::read_to_string(index).map_err(CliError::Io)?;
    let result = cli::execute_fields(&FieldsOptions { definition })?;
    if result.dynamic {
        println!("* (dynamic: all fields indexed)");
    }
    for (path, declared) in result.paths {
        println!("{}: {}", path, declared);
    }
    Ok(())
}
