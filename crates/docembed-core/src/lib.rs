#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod documents;
pub mod error;
pub mod pipeline;
pub mod traits;
pub mod types;
