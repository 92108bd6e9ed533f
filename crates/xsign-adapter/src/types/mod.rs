/*
[INPUT]:  Verb, stream kind, and token mode names
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions shared across the crate
[UPDATE]: When new request or stream types are added
*/

pub mod enums;

pub use enums::*;
