#![allow(dead_code)]

mod archive;
mod fetcher;

pub use archive::*;
pub use fetcher::*;
