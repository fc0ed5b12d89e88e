//! Time model and time-criterion decoding
//!
//! [`TimeValue`] is the nanosecond-precision instant every other component
//! works in. [`TimeSelector`] turns `-a`/`-m`/`-A`/`-M` style expressions into
//! a [`SelectionCriterion`] relative to the run's start time.

pub mod error;
pub mod selector;
pub mod value;

pub use error::TimeError;
pub use selector::{
    DEFAULT_TIMESTAMP_FORMAT, Direction, SelectionCriterion, TimeField, TimeSelector,
    template_display,
};
pub use value::{NANOS_PER_SEC, TimeValue};
