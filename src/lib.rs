#![cfg_attr(feature = "failfast", allow(unreachable_code))]

//! Reconciliation of GraphQL operation results into schema-driven form data.
//!
//! A form binds its GraphQL operations through [`GraphElement`] descriptors:
//! which operation's payload feeds the form, how that payload is projected
//! ([`GraphElement::result_key`]) and shaped ([`ResultType`]), whether new
//! data merges with or replaces the current value ([`MergeStrategy`]), and an
//! optional [`ResultMap`] restructuring applied last. [`next_form_data`]
//! computes the next form value from a completed operation without mutating
//! any of its inputs. Result-map failures are logged and absorbed so the form
//! always receives the best available value.

macro_rules! failfast_debug {
    ($($tokens:tt)+) => {{
        tracing::debug!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

macro_rules! failfast_error {
    ($($tokens:tt)+) => {{
        tracing::error!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

mod error;
mod form_data;
mod graph;
mod json_ext;
mod result_map;

pub use error::*;
pub use form_data::*;
pub use graph::*;
pub use json_ext::*;
pub use result_map::*;
