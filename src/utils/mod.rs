pub mod date;
pub mod path;
pub mod time;
pub mod table;
pub mod colors;
