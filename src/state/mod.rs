//! Cross-invocation state: the feed cursor, the exclusion list, and the
//! raw post log. All three live in the blob store; none are cached
//! between invocations.

pub mod checkpoint;
pub mod exclusions;
pub mod post_log;

pub use checkpoint::CheckpointStore;
pub use exclusions::ExclusionList;
pub use post_log::PostLog;
