pub mod analyzers;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod parser;
pub mod record;
pub mod source;
