pub mod camera;
pub mod core;
pub mod projection;
pub mod scene;
pub mod systems;
pub mod tracking;
