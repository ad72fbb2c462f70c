pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::VaultStore;
pub use types::{MediaRecord, NewComment, NewMedia, VaultStats, VisitedPost};
