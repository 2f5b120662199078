//! Pure labour-time computations: no database access in here.

pub mod attribution;
pub mod intervals;
pub mod timesheet;
pub mod window;
