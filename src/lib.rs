//! xlsxlinks - Extract cell hyperlinks from Excel sheets and join them to row data
//!
//! Spreadsheet cells often show a product name while linking to the product page.
//! Bulk readers only see the displayed text, so this crate reads the hyperlink
//! targets straight from the worksheet XML, pairs each one with the row's
//! identifier, and merges them back into the full row table loaded through calamine.
//! A 9-digit product code is pulled out of every URL, and a small blocking client
//! can look products up in the retailer's product API.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxlinks::ExtractorBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Defaults: first sheet, `ProductURL` hyperlink column, `ItemID` identifier
//!     let extractor = ExtractorBuilder::new().build()?;
//!
//!     let table = extractor.extract_path("basket.xlsx")?;
//!     for row in table.rows() {
//!         println!("{:?}", row);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Custom Columns and Output
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxlinks::{ExtractorBuilder, OutputFormat, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ExtractorBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Basket".to_string()))
//!         .with_url_column("Item")
//!         .with_id_column("SKU")
//!         .with_description_column("ItemName")
//!         .with_output_format(OutputFormat::Json)
//!         .build()?;
//!
//!     let input = File::open("basket.xlsx")?;
//!     let output = File::create("basket.json")?;
//!     extractor.extract_to_writer(input, output)?;
//!     Ok(())
//! }
//! ```
//!
//! # Product Lookup
//!
//! ```rust,no_run
//! use xlsxlinks::{extract_nutrition, extract_product_code, ProductClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProductClient::new(std::env::var("TESCO_API_KEY")?)?;
//!     if let Some(code) = extract_product_code("https://www.tesco.com/groceries/en-GB/products/254656543") {
//!         let product = client.product_data(code)?;
//!         let nutrition = extract_nutrition(&product)?;
//!         println!("{} nutrients", nutrition.len());
//!     }
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod client;
mod error;
mod extract;
mod output;
mod parser;
mod security;
mod table;
mod types;

// 公開API
pub use api::{OutputFormat, SheetSelector, StatusPolicy};
pub use builder::{Extractor, ExtractorBuilder};
pub use client::{
    extract_nutrition, ProductClient, API_KEY_HEADER, DEFAULT_SEARCH_LIMIT, PRODUCT_DATA_URL,
    PRODUCT_SEARCH_URL,
};
pub use error::Error;
pub use extract::{extract_product_code, HeaderMap, LinkRecord, LinkTable, PRODUCT_CODE_PATTERN};
pub use output::{OutputFormatter, MISSING_VALUE};
pub use table::Table;
pub use types::CellValue;
