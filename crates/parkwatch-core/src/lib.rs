pub mod plate;
pub mod slot;
pub mod window;

pub use plate::{PlateError, PlateToken};
pub use window::ReportWindow;
