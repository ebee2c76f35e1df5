pub mod deal;
pub mod formula;
pub mod settings;
pub mod variance;
