pub mod url_validation;
pub use url_validation::{UrlValidationError, api_url, validate_endpoint};
