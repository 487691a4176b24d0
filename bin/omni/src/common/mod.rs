mod error;
pub use error::*;

mod hex;
pub use hex::*;

mod logging;
pub use logging::*;

mod store;
pub use store::*;
