//! Headless view models for the student and vendor order screens.

pub mod student;
pub mod vendor;

pub use student::*;
pub use vendor::*;
