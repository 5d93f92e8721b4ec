use clap::{Parser as ClapParser, Subcommand};
use odata_expr::ast::InlineCount;
use odata_expr::cli::{self, CliError, QueryOptions, RowOptions};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "odata-expr")]
#[command(about = "Build OData query strings and inspect dynamic rows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a query string from filters and query options
    Query {
        /// Equality filter COLUMN:TYPE=VALUE (repeatable, combined with `and`)
        #[arg(long = "eq", value_name = "COLUMN:TYPE=VALUE")]
        equals: Vec<String>,

        /// Sort key COLUMN:TYPE[:desc] (repeatable)
        #[arg(long, value_name = "COLUMN:TYPE[:desc]")]
        order_by: Vec<String>,

        /// Maximum number of results
        #[arg(long)]
        top: Option<u32>,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Response format (e.g. json)
        #[arg(long)]
        format: Option<String>,

        /// Inline count mode: none or allpages
        #[arg(long, default_value = "none")]
        inline_count: InlineCount,

        /// Projected column, or * for all (repeatable)
        #[arg(long, value_name = "COLUMN|*")]
        select: Vec<String>,
    },

    /// Read a JSON object as a row
    Row {
        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Column to read
        #[arg(short, long)]
        column: Option<String>,

        /// Type to read the column as (int32, string?, decimal, ...)
        #[arg(short = 't', long = "type", requires = "column")]
        column_type: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    install_tracing_subscriber();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Query {
            equals,
            order_by,
            top,
            skip,
            format,
            inline_count,
            select,
        } => run_query(QueryOptions {
            equals,
            order_by,
            top,
            skip,
            format,
            inline_count,
            select,
        }),
        Commands::Row {
            input,
            column,
            column_type,
            pretty,
        } => run_row(input, column, column_type, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_query(options: QueryOptions) -> Result<(), CliError> {
    println!("{}", cli::execute_query(&options)?);
    Ok(())
}

fn run_row(
    input: Option<String>,
    column: Option<String>,
    column_type: Option<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RowOptions {
        input,
        column,
        column_type,
        pretty,
    };

    let output = cli::execute_row(&options)?;
    let json = if options.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
