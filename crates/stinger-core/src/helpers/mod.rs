// crates/stinger-core/src/helpers/mod.rs
//
// Small pure utilities shared by the state machine and the CLI.

pub mod time;
