pub mod formatter;
pub mod fs;
