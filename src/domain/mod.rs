pub mod ai;
pub mod entity;
pub mod grid;
pub mod physics;
pub mod rules;
