pub mod config;
pub mod controller;
pub mod device;
pub mod document;
pub mod focus;
pub mod keyboard;
pub mod model;
pub mod replay;
pub mod scheduler;
pub mod surface;
pub mod trace;
pub mod translate;
pub mod typing;
