mod classification;

pub use classification::*;
