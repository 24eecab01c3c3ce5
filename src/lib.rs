//! tick-pin: a countdown widget pinned on top of the terminal.
//!
//! The countdown logic lives in [`controller`] and talks to the outside
//! world only through its `WindowSurface`, `TopmostPinner` and `AlertSink`
//! traits; [`app`] and [`ui`] supply the terminal implementations.

pub mod alert;
pub mod app;
pub mod codec;
pub mod config;
pub mod controller;
pub mod font;
pub mod geometry;
pub mod menu;
pub mod ui;
