mod error;
mod meta;
mod parse;

pub use error::UrlError;
pub use meta::UrlMeta;
pub use parse::{filter_useless_part, pack, parse_query_string, parse_url};
