//! Tree-sitter powered structured documents for the Weft codemod engine.
//!
//! This crate is the single seam between the engine and the concrete parser.
//! It provides:
//!
//! - **Documents** via [`SourceDocument`]: parse, query, edit and print one
//!   JavaScript or TypeScript module
//! - **Queries** in [`query`]: callees, exported bindings, object properties
//!   and dynamic imports
//! - **Sequence insertion** via [`insert_items`]: layout-preserving appends
//!   into array, object and import lists
//! - **Imports** via [`ensure_import`]: deduplicated import declarations
//! - **Validation** via [`SyntaxGuard`]: rejects edits that introduce syntax
//!   errors
//!
//! # Example
//!
//! ```
//! use weft_syntax::{Layout, Placement, SourceDocument, insert_items, query};
//!
//! let mut doc = SourceDocument::parse("start/kernel.ts", "router.use([])")?;
//! let edit = {
//!     let call = query::calls_to(&doc, "router.use")[0];
//!     let array = query::call_arguments(call)[0];
//!     insert_items(
//!         &doc,
//!         array,
//!         &["() => import('#middleware/auth')".to_owned()],
//!         Placement::Append,
//!         Layout::Multiline,
//!     )
//! };
//! if let Some(edit) = edit {
//!     doc.apply(&edit)?;
//! }
//! assert!(doc.text().contains("#middleware/auth"));
//! # Ok::<(), weft_syntax::SyntaxError>(())
//! ```

mod document;
mod error;
mod guard;
mod imports;
mod language;
mod parser;
mod position;
pub mod query;
mod sequence;

pub use document::{SourceDocument, TextEdit};
pub use error::SyntaxError;
pub use guard::{SyntaxGuard, ValidationFailure};
pub use imports::{ImportRequirement, ensure_import};
pub use language::SourceLanguage;
pub use parser::{ParseResult, Parser, SyntaxErrorInfo};
pub use query::ExportTarget;
pub use sequence::{
    Delimiter, INDENT_UNIT, Layout, Placement, insert_items, property_chain, replace_item,
};
pub use tree_sitter::Node;
