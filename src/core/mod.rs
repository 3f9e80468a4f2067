//! Core helpers shared by the renderer.

pub mod text;
