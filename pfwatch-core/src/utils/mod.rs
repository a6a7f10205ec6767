pub mod duration;
pub mod logbook;
pub mod state;
