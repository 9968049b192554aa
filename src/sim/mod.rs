pub mod event;
pub mod level;
pub mod protester;
pub mod step;
pub mod world;
