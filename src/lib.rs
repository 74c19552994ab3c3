//! Epub assembly library
//!
//! A Rust library for assembling and inspecting EPUB eBook files.
//!
//! This library builds valid EPUB publications from a set of resources,
//! metadata, a raster cover, and a table-of-contents tree. It supports both
//! the EPUB 2 and EPUB 3 format generations and derives all required
//! auxiliary documents (package document, navigation document, NCX, cover
//! page, container pointer) with mutually consistent cross-references. A
//! small reader is included for locating and classifying finished
//! publications.
//!
//! ## Features
//!
//! - Assemble EPUB 2 and EPUB 3 publications into any `Write + Seek` target.
//! - Version-aware document generation: navigation document, NCX, landmarks,
//!   and guide emission follow the target generation and two feature flags.
//! - Streamed resource registration, straight into the archive.
//! - Optional asynchronous flavor via the `async` feature, producing
//!   byte-identical archives.
//!
//! ## Quick Start
//!
//! ### Build an EPUB file
//!
//! ```rust, no_run
//! # fn main() -> Result<(), bindery::error::EpubError> {
//! use std::fs::File;
//!
//! use bindery::{
//!     EpubWriter,
//!     types::{EpubNavItem, EpubResource, EpubVersion},
//! };
//!
//! let file = File::create("book.epub")?;
//! let mut writer = EpubWriter::create(file, EpubVersion::Epub3)?;
//!
//! writer.title = "My Book".to_string();
//! writer.add_resource(
//!     &mut "<html><body>Hello</body></html>".as_bytes(),
//!     EpubResource::new("chapter-1.xhtml"),
//! )?;
//! writer.add_toc(vec![EpubNavItem::new("Chapter 1", "chapter-1.xhtml")], false)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspect an EPUB file
//!
//! ```rust, no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::fs::File;
//!
//! use bindery::EpubReader;
//!
//! let mut reader = EpubReader::new(File::open("book.epub")?)?;
//! println!("Version: {:?}", reader.version());
//! println!("Last modified: {}", reader.guess_last_modified());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `async`: Enables the suspending registration and finalization methods
//!   on [EpubWriter] backed by tokio. The synchronous API is always
//!   available and both flavors produce identical output.

pub mod error;
pub mod mediatype;
pub mod reader;
pub mod types;
pub mod writer;
pub mod xml;

pub use reader::EpubReader;
pub use writer::{DocumentPolicy, EpubWriter};
