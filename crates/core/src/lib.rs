pub mod domain;
pub mod error;
pub mod store;

pub use domain::files::FileSet;
pub use domain::identity::TaskIdentity;
pub use domain::record::RepositoryRecord;
pub use domain::round::RoundSpec;
pub use error::{CoreError, Result};
pub use store::RepositoryStore;
