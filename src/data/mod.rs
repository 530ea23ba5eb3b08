pub mod blocks;
pub mod parser;
pub mod reshape;
