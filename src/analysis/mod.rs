pub mod parser;
pub mod runner_match;

pub use parser::parse_prediction;
pub use runner_match::resolve_runner;
