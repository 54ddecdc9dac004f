//! otomoto.pl Adapter Modules
//!
//! 検索結果ページのパースとHTTPヘッダー

pub mod page_parser;
pub mod user_agent;

pub use page_parser::{parse_search_page, PageError, ParsedPage};
pub use user_agent::random_user_agent;
