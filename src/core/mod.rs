pub mod concat;
pub mod constants;
pub mod error;
pub mod format;
pub mod reader;
pub mod resample;
pub mod run;
pub mod series;
pub mod smooth;
pub mod store;
pub mod writer;
