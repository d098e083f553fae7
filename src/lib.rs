pub mod config;
pub mod contact;
pub mod filter;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod source;
pub mod storage;
pub mod utils;
pub mod view;
