//! Durable file primitives shared by the disk cache and the invalidation
//! cursor.

pub mod atomic;

pub use atomic::{fsync_dir, fsync_file, remove_durable, write_atomic};
