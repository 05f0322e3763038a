pub mod grid;
pub mod models;
pub mod modes;
pub mod protocol;
