pub mod judge;
pub mod lane;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod tracker;
