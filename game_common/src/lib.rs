//! Shared low-level collections used by the asset and render crates.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_crate_dependencies)]

extern crate self as game_common;

pub mod collections;
