/*!
 * sqcl - completion module
 *
 * Context-aware tab completion for the REPL:
 * - SQL keyword completion from the active dialect
 * - Table, column and database names from a TTL metadata cache
 * - Syntax highlighting and history hints
 */

pub mod context;
pub mod engine;
pub mod helper;
pub mod highlight;
pub mod metadata;
pub mod suggestion;
pub mod tokenizer;

pub use engine::CompletionEngine;
pub use helper::SqlHelper;
pub use highlight::SqlHighlighter;
pub use metadata::MetadataCache;
