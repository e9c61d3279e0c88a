//! Animated water surface.
//!
//! A `resolution × resolution` grid over a 20×20 plane at `y = -2`, displaced
//! by [`WaveField`] and colored by mixing two colors by elevation. The grid is
//! emitted as a wireframe.
//!
//! Time policy: absolute. `update` only copies the elapsed time into the
//! `time` uniform; every height is a pure function of that uniform.

use glam::{Vec2, Vec3};

use crate::effect::Effect;
use crate::field::WaveField;
use crate::lifecycle::Lifecycle;
use crate::params::{ParamSet, ParamSpec};
use crate::scene::{DrawList, NodeId, Scene};
use crate::time::FrameTime;
use crate::visuals::rgb_hex;

pub const NAME: &str = "fluid";

/// Side length of the square surface.
pub const EXTENT: f32 = 20.0;
/// Rest height of the surface.
pub const SURFACE_Y: f32 = -2.0;

const LOW_COLOR: u32 = 0x667eea;
const HIGH_COLOR: u32 = 0x764ba2;

fn specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("intensity", "Wave intensity", 0.1, 2.0, 0.1, 1.0),
        ParamSpec::integer("resolution", "Grid resolution", 8.0, 256.0, 8.0, 128.0),
        ParamSpec::new("opacity", "Opacity", 0.1, 1.0, 0.1, 0.8),
    ]
}

/// The fluid surface effect.
pub struct Fluid {
    lifecycle: Lifecycle,
    params: ParamSet,
    /// Rest positions of the grid vertices in the XZ plane, row-major.
    grid: Vec<Vec2>,
    /// Shader `time` uniform.
    time: f32,
    low: Vec3,
    high: Vec3,
}

impl Fluid {
    pub fn new(scene: &mut Scene) -> Self {
        let mut fluid = Self {
            lifecycle: Lifecycle::new(NAME),
            params: ParamSet::new(specs()),
            grid: Vec::new(),
            time: 0.0,
            low: rgb_hex(LOW_COLOR),
            high: rgb_hex(HIGH_COLOR),
        };
        fluid.build_grid();
        let node = scene.allocate(NAME);
        fluid.lifecycle.attach(vec![node]);
        fluid
    }

    /// Last value written to the `time` uniform.
    pub fn time_uniform(&self) -> f32 {
        self.time
    }

    /// The height field at the current intensity.
    pub fn field(&self) -> WaveField {
        WaveField::new(self.params.value("intensity"))
    }

    /// Vertices per grid side.
    pub fn side(&self) -> usize {
        self.params.value("resolution") as usize + 1
    }

    /// Number of grid vertices.
    pub fn vertex_count(&self) -> usize {
        self.grid.len()
    }

    /// Displaced surface point and its elevation for grid vertex `i`.
    pub fn vertex(&self, i: usize) -> (Vec3, f32) {
        let base = self.grid[i];
        let h = self.field().height(base.x, base.y, self.time);
        (Vec3::new(base.x, SURFACE_Y + h, base.y), h)
    }

    fn build_grid(&mut self) {
        let side = self.side();
        let step = EXTENT / (side - 1) as f32;
        let half = EXTENT * 0.5;
        self.grid = (0..side * side)
            .map(|i| Vec2::new((i % side) as f32 * step - half, (i / side) as f32 * step - half))
            .collect();
    }

    fn color(&self, elevation: f32) -> Vec3 {
        self.low.lerp(self.high, (elevation + 0.5).clamp(0.0, 1.0))
    }
}

impl Effect for Fluid {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn simulate(&mut self, time: &FrameTime) {
        self.time = time.elapsed;
    }

    fn draw(&self, _node: NodeId, out: &mut DrawList) {
        let side = self.side();
        let alpha = self.params.value("opacity");

        out.lines.reserve(side * (side - 1) * 4);
        for row in 0..side {
            for col in 0..side {
                let i = row * side + col;
                let (p, h) = self.vertex(i);
                let c = self.color(h).extend(alpha);
                if col + 1 < side {
                    out.push_line(p, self.vertex(i + 1).0, c);
                }
                if row + 1 < side {
                    out.push_line(p, self.vertex(i + side).0, c);
                }
            }
        }
    }

    fn apply(&mut self, param: &str, _value: f32, scene: &mut Scene) {
        if param == "resolution" {
            self.build_grid();
            let node = scene.allocate(NAME);
            self.lifecycle.replace_nodes(scene, vec![node]);
            log::info!("'{}' rebuilt at {}x{}", NAME, self.side(), self.side());
        }
    }

    fn release(&mut self) {
        self.grid = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_uniform_follows_elapsed() {
        let mut scene = Scene::new();
        let mut fluid = Fluid::new(&mut scene);
        fluid.start(&mut scene);
        fluid.update(&FrameTime::new(0.016, 12.5, 3));
        assert_eq!(fluid.time_uniform(), 12.5);
    }

    #[test]
    fn test_inactive_keeps_time() {
        let mut scene = Scene::new();
        let mut fluid = Fluid::new(&mut scene);
        fluid.update(&FrameTime::new(0.016, 12.5, 3));
        assert_eq!(fluid.time_uniform(), 0.0);
    }

    #[test]
    fn test_default_grid() {
        let mut scene = Scene::new();
        let fluid = Fluid::new(&mut scene);
        assert_eq!(fluid.vertex_count(), 129 * 129);
    }

    #[test]
    fn test_resolution_rebuilds_grid() {
        let mut scene = Scene::new();
        let mut fluid = Fluid::new(&mut scene);
        fluid.configure("resolution", 16.0, &mut scene).unwrap();
        assert_eq!(fluid.vertex_count(), 17 * 17);

        let mut list = DrawList::new();
        fluid.draw(fluid.lifecycle().nodes()[0], &mut list);
        assert_eq!(list.line_count(), 2 * 17 * 16);
    }

    #[test]
    fn test_vertices_stay_near_surface() {
        let mut scene = Scene::new();
        let mut fluid = Fluid::new(&mut scene);
        fluid.configure("intensity", 2.0, &mut scene).unwrap();
        fluid.start(&mut scene);
        fluid.update(&FrameTime::new(0.016, 4.0, 0));
        let bound = fluid.field().max_height() + 1e-5;
        for i in 0..fluid.vertex_count() {
            let (p, h) = fluid.vertex(i);
            assert!(h.abs() <= bound);
            assert!(p.x.abs() <= EXTENT * 0.5 + 1e-4);
            assert!((p.y - SURFACE_Y - h).abs() < 1e-5);
        }
    }
}
