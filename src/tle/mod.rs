mod cache;
mod error;
mod fetcher;
mod parsing;
pub mod source;
mod types;

pub use cache::TleCache;
pub use error::FetchError;
pub use fetcher::TleFetcher;
pub use parsing::parse_element_set;
pub use source::{CelestrakSource, TleSource};
pub use types::ElementSet;
