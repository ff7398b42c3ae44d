mod deploy;
mod health;

pub use deploy::*;
pub use health::*;
