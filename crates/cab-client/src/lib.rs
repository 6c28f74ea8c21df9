pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod page;
pub mod session;

#[cfg(feature = "http")]
pub use api::HttpBackend;
pub use api::{Backend, Endpoint};
pub use config::ClientConfig;
pub use decode::{decode_response, encode_response};
pub use error::ApiError;
pub use page::{complex_action_page_url, decode_new_tab, parse_page_query};
pub use session::{BusyFlag, CabSession};
