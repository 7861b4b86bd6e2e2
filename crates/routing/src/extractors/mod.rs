//! Request extractors.

mod access_token;
mod query;
mod request_context;

pub use access_token::AccessToken;
pub use query::{QueryParams, encode_query};
pub use request_context::RequestContextExtractor;
