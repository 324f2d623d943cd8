mod device_handler;
mod server;

pub use device_handler::*;
pub use server::*;
