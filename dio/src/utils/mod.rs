pub mod bits;
pub mod meminterface;
