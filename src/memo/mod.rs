//! Memo Module
//!
//! Function wrappers that cache results keyed by input.
//!
//! # Variants
//! - [`Memoized`]: owns the function, single-threaded (`&mut self` calls)
//! - [`SharedMemo`]: async, shareable behind `Arc`, one evaluation per key
//!   in flight

mod memoized;
mod shared;


pub use memoized::{forget, memoize, Memoized};
pub use shared::SharedMemo;
