// crates/stinger-cli/src/commands/mod.rs
//
// One module per subcommand. Each exposes a clap `Args` struct and `run`.

pub mod probe;
pub mod render;
