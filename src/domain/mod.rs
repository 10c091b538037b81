pub mod catalog;
pub mod desktop;
pub mod dialogue;
pub mod level;
pub mod terminal;
