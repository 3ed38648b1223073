pub mod api_server_axum;
pub mod error;
pub mod logging;
pub mod nse;
pub mod utility;

pub use error::NSEError;
