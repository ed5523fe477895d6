pub mod api;
pub mod config;
pub mod data_models;
pub mod dom;
pub mod error;
pub mod flow;
pub mod http;
pub mod page;
pub mod search_api;
pub mod summary;

pub use config::Config;
pub use data_models::{Query, SearchResult};
pub use error::{ClientError, Result};
pub use flow::{SearchFlow, SearchOutcome};
pub use page::SearchPage;
