//! xlsxlinks command-line tool
//!
//! Extracts hyperlinks from an Excel sheet and merges them into the row table,
//! or queries the product API by free text or product code.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use xlsxlinks::{
    extract_nutrition, Error, ExtractorBuilder, OutputFormat, OutputFormatter, ProductClient,
    SheetSelector, StatusPolicy, DEFAULT_SEARCH_LIMIT,
};

/// Extract cell hyperlinks from Excel sheets and look products up by code
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract hyperlinks from a sheet and merge them into the row table.
    Extract(ExtractArgs),
    /// Search the product API by free text.
    Search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Fetch one product by its code.
    Product {
        id: String,
        /// Print the nutrition table instead of the raw product JSON.
        #[arg(long)]
        nutrition: bool,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Input workbook (.xlsx)
    file: PathBuf,
    /// Sheet name
    #[arg(long, conflicts_with = "sheet_index")]
    sheet: Option<String>,
    /// Sheet position (0-based)
    #[arg(long)]
    sheet_index: Option<usize>,
    /// Column holding the hyperlinks
    #[arg(long, default_value = "ProductURL")]
    url_column: String,
    /// Column holding the row identifier
    #[arg(long, default_value = "ItemID")]
    id_column: String,
    /// New name for the hyperlink column's display text
    #[arg(long, default_value = "ProductDescription")]
    description_column: String,
    /// Name of the appended URL column
    #[arg(long, default_value = "ProductURL")]
    link_column: String,
    /// Name of the appended product code column
    #[arg(long, default_value = "ProductCode", conflicts_with = "no_product_code")]
    code_column: String,
    /// Do not append a product code column
    #[arg(long)]
    no_product_code: bool,
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApiArgs {
    /// Product API subscription key
    #[arg(long, env = "TESCO_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Return error bodies instead of failing on non-2xx statuses
    #[arg(long)]
    passthrough: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Search {
            query,
            limit,
            offset,
            api,
        } => run_search(&query, limit, offset, &api),
        Commands::Product {
            id,
            nutrition,
            format,
            api,
        } => run_product(&id, nutrition, format, &api),
    };

    if let Err(e) = result {
        handle_error(e);
        process::exit(1);
    }
}

fn run_extract(args: ExtractArgs) -> Result<(), Error> {
    let selector = match (args.sheet, args.sheet_index) {
        (Some(name), _) => SheetSelector::Name(name),
        (None, Some(index)) => SheetSelector::Index(index),
        (None, None) => SheetSelector::default(),
    };
    let code_column = (!args.no_product_code).then_some(args.code_column);

    let extractor = ExtractorBuilder::new()
        .with_sheet_selector(selector)
        .with_url_column(args.url_column)
        .with_id_column(args.id_column)
        .with_description_column(args.description_column)
        .with_link_column(args.link_column)
        .with_product_code_column(code_column)
        .with_output_format(args.format.into())
        .build()?;

    let input = BufReader::new(File::open(&args.file)?);
    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            extractor.extract_to_writer(input, &mut writer)?;
            writer.flush()?;
            tracing::info!(
                input = %args.file.display(),
                output = %path.display(),
                "extraction completed"
            );
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            extractor.extract_to_writer(input, &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn client_for(api: &ApiArgs) -> Result<ProductClient, Error> {
    let policy = if api.passthrough {
        StatusPolicy::Passthrough
    } else {
        StatusPolicy::Raise
    };
    Ok(ProductClient::new(api.api_key.clone())?.with_status_policy(policy))
}

fn run_search(query: &str, limit: u32, offset: u32, api: &ApiArgs) -> Result<(), Error> {
    let results = client_for(api)?.product_search(query, limit, offset)?;
    print_json(&results)
}

fn run_product(id: &str, nutrition: bool, format: FormatArg, api: &ApiArgs) -> Result<(), Error> {
    let product = client_for(api)?.product_data(id)?;
    if !nutrition {
        return print_json(&product);
    }

    let table = extract_nutrition(&product)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    OutputFormatter::from_format(format.into()).render(&table, &mut handle)?;
    handle.flush()?;
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::UnexpectedResponse(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn handle_error(error: Error) {
    match error {
        Error::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        Error::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid Excel file or may be corrupted.");
        }
        Error::Zip(msg) => {
            eprintln!("ZIP Archive Error: {}", msg);
            eprintln!("The file may be corrupted or not a valid .xlsx archive.");
        }
        Error::Xml { part, message } => {
            eprintln!("XML Error in {}: {}", part, message);
        }
        Error::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
            eprintln!("Please check the sheet selection and column names.");
        }
        Error::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
        }
        Error::MissingColumn { column, sheet } => {
            eprintln!("Missing Column: '{}' is not in the header row of '{}'", column, sheet);
            eprintln!("Use --url-column / --id-column to name the columns in your sheet.");
        }
        Error::InvalidIdentifier { cell, value, .. } => {
            eprintln!("Invalid Identifier: '{}' at {} is not an integer", value, cell);
        }
        Error::Http(http_err) => {
            eprintln!("HTTP Error: {}", http_err);
        }
        Error::Status { status, url } => {
            eprintln!("Request Failed: {} returned status {}", url, status);
            if status == 401 {
                eprintln!("Check the API key (--api-key or TESCO_API_KEY).");
            }
        }
        Error::UnexpectedResponse(msg) => {
            eprintln!("Unexpected Response: {}", msg);
        }
    }
}
