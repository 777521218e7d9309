//! Flutter-facing bindings for IntroWall.

pub mod api;
