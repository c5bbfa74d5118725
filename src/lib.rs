#[macro_use]
extern crate tracing;

pub mod cli;
pub mod id;
pub mod persistence;
pub mod search;
pub mod tree;
pub mod webview;
