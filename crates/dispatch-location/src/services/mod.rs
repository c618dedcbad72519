mod location;

pub use location::{LocationService, LocationServiceConfig};
