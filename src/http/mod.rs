//! HTTP protocol layer module
//!
//! Response builders shared by the route handlers and the request entry point.

pub mod response;

pub use response::{
    build_400_response, build_413_response, build_500_response, build_html_response,
    build_redirect_response,
};
