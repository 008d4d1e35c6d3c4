pub mod error;
pub mod pipeline;
pub mod retry;

#[cfg(test)]
mod tests;
