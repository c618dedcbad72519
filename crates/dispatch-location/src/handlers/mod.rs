mod drivers;
mod health;
mod search;

pub use drivers::{
    batch_create_drivers, create_driver, delete_driver, get_driver, update_driver,
    update_driver_location,
};
pub use health::health_check;
pub use search::search_nearby;
