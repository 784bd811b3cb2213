pub mod clock;
pub mod periodic;
