//! Pipeline entry points for the four invocations.
//!
//! - `run_collect`: scheduled incremental collection
//! - `run_recollect`: on-demand recollection by post URL
//! - `run_rebuild`: full rebuild from the raw post history
//! - `run_invalidate`: storage-event-driven edge cache invalidation
//!
//! Each invocation executes sequentially and single-threaded; partition
//! and format writes happen one at a time in a fixed order. There is no
//! cross-invocation coordination (see `recording`).

pub mod collect;
pub mod invalidate;
pub mod rebuild;
pub mod recollect;
pub mod render;

pub use collect::run_collect;
pub use invalidate::{EdgeCache, run_invalidate};
pub use rebuild::run_rebuild;
pub use recollect::{MAX_RECOLLECT_URLS, run_recollect};
