pub mod analyzers;
pub mod canonical;
pub mod ingest;
pub mod output;
pub mod parser;
pub mod stats;
pub mod window;
