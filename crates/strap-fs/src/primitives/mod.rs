pub mod dir;
pub mod promote;
pub mod remove;
pub mod rw;
pub mod symlink;

pub use dir::{ensure_dir, is_effectively_empty};
pub use promote::promote_dir;
pub use remove::remove_path;
pub use rw::{Options as WriteOptions, atomic_write};
pub use symlink::symlink;
