pub mod devices_api;
pub mod domain;
pub mod http;

pub use devices_api::*;
pub use domain::*;
pub use http::*;
