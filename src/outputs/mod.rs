//! Output generation.
//!
//! - [`json`]: batched writer for the single JSON array output file
//!
//! # Output Structure
//!
//! ```text
//! output_folder/
//! └── okx_news_20201001_20201030.json
//! ```

pub mod json;
