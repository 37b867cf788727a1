pub mod backup;
pub mod error;
pub mod io;
pub mod job;
pub mod presets;
pub mod replace;
pub mod rules;
pub mod run;
pub mod select;

pub use error::{Result, TextfixError};
