pub mod files;
pub mod identity;
pub mod record;
pub mod round;
