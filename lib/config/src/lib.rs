//! Build-time board configuration.
//!
//! The constants in [build_flags] are generated from `boards.json` at the workspace root.
//! The board is picked with the `BOARD` environment variable while building.

#![no_std]
#![deny(missing_docs)]

/// Flags of the selected board, one constant per key in `boards.json`.
#[allow(dead_code)]
pub mod build_flags {
    include!(concat!(env!("OUT_DIR"), "/build_flags.rs"));
}
