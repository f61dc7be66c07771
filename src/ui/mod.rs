pub mod display;

pub use display::{Diagnostic, DisplayState, TransportLabel};
