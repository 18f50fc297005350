// File I/O operations

pub mod csv;
pub mod input;
pub mod json;
pub mod memo;
pub mod report;
pub mod xlsx;

pub use input::load_input;
pub use xlsx::CalamineReader;
