pub mod facts;
pub mod inputs;

pub use facts::Fact;
