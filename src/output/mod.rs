//! Output: persistence sink and end-of-run reports

pub mod json;
pub mod sink;
pub mod text;
