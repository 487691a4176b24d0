mod cmd;
pub use cmd::*;
