pub mod init;
pub mod parse;
pub mod replay;

pub use init::{init, InitArgs};
pub use parse::{parse, ParseArgs};
pub use replay::{replay, ReplayArgs};
