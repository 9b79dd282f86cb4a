//! Layout policies
//!
//! Each policy is a pure function from measured marker footprints to
//! move targets; only [`arrange`] talks to the host directly, since it
//! rewrites leaders as it goes. Applying the targets back to the
//! document is the executor's job.

pub mod align;
pub mod arrange;
pub mod distribute;
pub mod types;
pub mod untangle;

pub use align::{align, AlignKind};
pub use arrange::{arrange, ArrangeConfig, ArrangeReport};
pub use distribute::distribute;
pub use types::{AnnotationBox, Axis, Corner, MoveTarget};
pub use untangle::{untangle, UntangleItem};
