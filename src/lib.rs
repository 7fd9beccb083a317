//! Chatsim library exports for testing

pub mod cli;
pub mod core;
pub mod markup;
pub mod responder;

#[cfg(test)]
pub mod test_support;
