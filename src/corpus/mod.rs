//! Knowledge corpus: spreadsheet loading and the TF-IDF lexical index.
pub mod index;
pub mod loader;
pub mod stop_words;
pub mod tfidf;

pub use index::{LexicalIndex, Match};
pub use loader::{LoadError, load_documents};
pub use tfidf::TfidfError;
