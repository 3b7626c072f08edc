mod biped_error;

pub use biped_error::*;
