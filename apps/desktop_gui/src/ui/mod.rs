//! UI layer: the page shell and its panels.

pub mod app;

pub use app::PulseCheckApp;
