pub mod common;
pub mod configs;
pub mod protocol;
pub mod sources;
