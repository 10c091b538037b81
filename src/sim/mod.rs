pub mod command;
pub mod controller;
pub mod credits;
pub mod event;
pub mod layout;
pub mod menu;
pub mod presenter;
pub mod save;
pub mod session;
pub mod windows;
