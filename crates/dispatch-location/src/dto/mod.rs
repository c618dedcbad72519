mod request;
mod response;

pub use request::{BatchCreateRequest, UpdateDriverRequest};
pub use response::HealthResponse;
