// crates/stinger-media/src/helpers/mod.rs
//
// Internal helper modules for stinger-media.
// Not re-exported from lib.rs; these are decode implementation details,
// not part of the API stinger-core and the CLI consume.

pub mod hw;
pub mod planes;
pub mod seek;
