pub mod contingency;
pub mod holding;
pub mod selling;
