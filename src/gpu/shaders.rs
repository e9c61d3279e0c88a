//! WGSL sources for every pipeline.
//!
//! WGSL has no includes, so the shared pieces (camera uniform, fullscreen
//! triangle) are prepended at compile time.

/// Billboarded point sprites.
pub const POINTS: &str = concat!(include_str!("shaders/camera.wgsl"), include_str!("shaders/points.wgsl"));

/// Colored line segments.
pub const LINES: &str = concat!(include_str!("shaders/camera.wgsl"), include_str!("shaders/lines.wgsl"));

/// Ray-marched cloud.
pub const VOLUMETRIC: &str = concat!(
    include_str!("shaders/camera.wgsl"),
    include_str!("shaders/fullscreen.wgsl"),
    include_str!("shaders/volumetric.wgsl"),
);

/// Reflective sphere scene.
pub const RAYTRACE: &str = concat!(
    include_str!("shaders/camera.wgsl"),
    include_str!("shaders/fullscreen.wgsl"),
    include_str!("shaders/raytrace.wgsl"),
);

/// Final color grading, offscreen target to surface.
pub const GRADE: &str = concat!(include_str!("shaders/fullscreen.wgsl"), include_str!("shaders/grade.wgsl"));

/// Every shader with a display name.
pub const ALL: [(&str, &str); 5] = [
    ("points", POINTS),
    ("lines", LINES),
    ("volumetric", VOLUMETRIC),
    ("raytrace", RAYTRACE),
    ("grade", GRADE),
];
