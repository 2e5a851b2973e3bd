use bevy::color::Color;

/// Thickness of the connecting line between the pending point and the cursor (metres).
pub const DRAW_LINE_WIDTH: f32 = 0.005;

/// Reticle ring inner radius (metres).
pub const RETICLE_INNER_RADIUS: f32 = 0.045;
/// Reticle ring outer radius (metres).
pub const RETICLE_OUTER_RADIUS: f32 = 0.05;
/// Reticle centre dot radius (metres).
pub const RETICLE_DOT_RADIUS: f32 = 0.005;
/// Segment count used when tessellating the reticle ring and dot.
pub const RETICLE_RESOLUTION: u32 = 32;

pub const RETICLE_COLOUR: Color = Color::WHITE;
pub const LINE_COLOUR: Color = Color::WHITE;
pub const LABEL_COLOUR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const LABEL_FONT_SIZE: f32 = 18.0;

/// Sky and ground tints of the hemisphere-style ambient light.
pub const AMBIENT_SKY_COLOUR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const AMBIENT_GROUND_COLOUR: Color = Color::srgb(0.73, 0.73, 1.0);
pub const AMBIENT_BRIGHTNESS: f32 = 400.0;

/// Half-width of the reference grid drawn on the simulated surface (metres).
pub const GRID_HALF_EXTENT: f32 = 5.0;
/// Spacing between reference grid lines (metres).
pub const GRID_SPACING: f32 = 0.5;
