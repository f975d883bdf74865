pub mod store;

pub use store::{FsStore, MediaStore, MediaStoreError};
