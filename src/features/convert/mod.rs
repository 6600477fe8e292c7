pub mod codec;
pub mod handler;
pub mod limits;
pub mod models;
pub mod naming;

pub use handler::create_convert_router;
pub use limits::{ALLOWED_EXTENSIONS, ConversionLimits, MAX_FILE_SIZE};
pub use models::{DecodeRequest, EncodeResponse, ValidateRequest, ValidateResponse};
