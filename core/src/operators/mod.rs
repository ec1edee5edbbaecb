//! Operator library over [`Seq`](crate::Seq).
//!
//! Operators are methods on `Seq` (and on [`Opt`](crate::Opt), see
//! [`crate::opt`]) plus the free combination functions in [`combine`].
//! Every operator returns a new lazy node and never touches its input.
//!
//! | module | operators | ordering |
//! |--------|-----------|----------|
//! | [`transform`] | `map`, `try_map`, `filter`, `inspect`, `log`, `transform`, `default_if_empty`, `switch_if_empty` | upstream order |
//! | [`flatten`] | `flat_map`, `concat_map` | emission time / upstream order |
//! | [`combine`] | `concat`, `merge`, `merge_sequential`, `zip`, `zip_all` | see each function |
//! | [`timing`] | `delay_elements` | upstream order |
//! | [`aggregate`] | `collect_list`, `count`, `first` | n/a |

pub mod aggregate;
pub mod combine;
pub mod flatten;
mod interleave;
pub mod timing;
pub mod transform;
