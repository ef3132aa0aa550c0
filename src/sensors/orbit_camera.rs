// Copyright @yucwang 2026

use crate::math::constants::{Float, Matrix4f, Point3f, Quaternionf, Vector2f, Vector3f, DEG_TO_RAD};
use crate::math::smooth_damp::smooth_damp;

const ORBIT_GAIN: Float = 0.1;
const PAN_GAIN: Float = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCameraSettings {
    pub distance: Float,
    pub orbit_speed: Float,
    pub zoom_speed: Float,
    pub min_distance: Float,
    pub max_distance: Float,
    pub limit_vertical_rotation: bool,
    pub min_vertical_angle: Float,
    pub max_vertical_angle: Float,
    pub pan_speed: Float,
    pub smooth_time: Float,
    pub invert_y: bool,
    pub auto_rotate: bool,
    pub auto_rotate_speed: Float,
    /// Camera position restored by `reset`.
    pub default_position: Vector3f,
    /// Euler angles in degrees, (pitch, yaw, roll).
    pub default_rotation: Vector3f,
    pub target_offset: Vector3f,
}

impl Default for OrbitCameraSettings {
    fn default() -> Self {
        Self {
            distance: 10.0,
            orbit_speed: 3.0,
            zoom_speed: 2.0,
            min_distance: 5.0,
            max_distance: 30.0,
            limit_vertical_rotation: true,
            min_vertical_angle: -80.0,
            max_vertical_angle: 80.0,
            pan_speed: 0.5,
            smooth_time: 0.1,
            invert_y: false,
            auto_rotate: false,
            auto_rotate_speed: 5.0,
            default_position: Vector3f::new(7.0, 3.0, -7.0),
            default_rotation: Vector3f::new(15.0, -45.0, 0.0),
            target_offset: Vector3f::zeros(),
        }
    }
}

impl OrbitCameraSettings {
    /// Zoom bounds with the ends put in order.
    pub fn distance_range(&self) -> (Float, Float) {
        ordered(self.min_distance, self.max_distance)
    }

    /// Pitch bounds with the ends put in order.
    pub fn vertical_range(&self) -> (Float, Float) {
        ordered(self.min_vertical_angle, self.max_vertical_angle)
    }

    /// Starting distance, kept inside the zoom bounds.
    pub fn initial_distance(&self) -> Float {
        let (lo, hi) = self.distance_range();
        clamp_between(self.distance, lo, hi)
    }
}

fn ordered(a: Float, b: Float) -> (Float, Float) {
    if a <= b { (a, b) } else { (b, a) }
}

// NaN bounds are ignored rather than panicking like `f32::clamp`.
fn clamp_between(value: Float, lo: Float, hi: Float) -> Float {
    value.max(lo).min(hi)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetView {
    Front,
    Right,
    Top,
    Perspective,
}

impl PresetView {
    pub const ALL: [PresetView; 4] = [PresetView::Front, PresetView::Right,
                                      PresetView::Top, PresetView::Perspective];

    /// (yaw, pitch) in degrees.
    pub fn angles(self) -> (Float, Float) {
        match self {
            PresetView::Front => (0.0, 0.0),
            PresetView::Right => (90.0, 0.0),
            PresetView::Top => (0.0, 90.0),
            PresetView::Perspective => (-45.0, 30.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PresetView::Front => "front",
            PresetView::Right => "right",
            PresetView::Top => "top",
            PresetView::Perspective => "perspective",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|view| view.name().eq_ignore_ascii_case(name))
    }
}

/// One frame of pointer and keyboard state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraInput {
    pub pointer_delta: Vector2f,
    pub orbit_button: bool,
    pub pan_button: bool,
    pub scroll: Float,
    pub auto_rotate_key: bool,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            pointer_delta: Vector2f::zeros(),
            orbit_button: false,
            pan_button: false,
            scroll: 0.0,
            auto_rotate_key: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Idle,
    Orbiting,
    Panning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vector3f,
    pub target: Vector3f,
    pub up: Vector3f,
}

impl CameraPose {
    pub fn forward(&self) -> Vector3f {
        (self.target - self.position).normalize()
    }

    pub fn view_matrix(&self) -> Matrix4f {
        Matrix4f::look_at_rh(&Point3f::from(self.position),
                             &Point3f::from(self.target),
                             &self.up)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ButtonEdge {
    last: Option<bool>,
}

impl ButtonEdge {
    /// Returns (pressed, released). The first sample only records the level.
    fn sample(&mut self, now: bool) -> (bool, bool) {
        let edges = match self.last {
            Some(before) => (!before && now, before && !now),
            None => (false, false),
        };
        self.last = Some(now);
        edges
    }
}

fn wrap_degrees(angle: Float) -> Float {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Orbit rotation `Ry(yaw) * Rx(pitch)`, angles in degrees.
pub fn orbit_rotation(yaw: Float, pitch: Float) -> Quaternionf {
    Quaternionf::from_axis_angle(&Vector3f::y_axis(), yaw * DEG_TO_RAD)
        * Quaternionf::from_axis_angle(&Vector3f::x_axis(), pitch * DEG_TO_RAD)
}

pub struct OrbitCameraController {
    settings: OrbitCameraSettings,
    yaw: Float,
    pitch: Float,
    distance: Float,
    target_offset: Vector3f,
    position: Vector3f,
    velocity: Vector3f,
    orbiting: bool,
    panning: bool,
    orbit_edge: ButtonEdge,
    pan_edge: ButtonEdge,
}

impl OrbitCameraController {
    /// Starts from the configured default pose.
    pub fn new(settings: OrbitCameraSettings) -> Self {
        let position = settings.default_position;
        let rotation = settings.default_rotation;
        Self::from_transform(settings, position, rotation)
    }

    /// Starts from an existing camera transform; `euler_degrees` is (pitch, yaw, roll).
    pub fn from_transform(settings: OrbitCameraSettings,
                          position: Vector3f,
                          euler_degrees: Vector3f) -> Self {
        let distance = settings.initial_distance();
        let target_offset = settings.target_offset;
        Self {
            settings,
            yaw: euler_degrees.y,
            pitch: wrap_degrees(euler_degrees.x),
            distance,
            target_offset,
            position,
            velocity: Vector3f::zeros(),
            orbiting: false,
            panning: false,
            orbit_edge: ButtonEdge::default(),
            pan_edge: ButtonEdge::default(),
        }
    }

    pub fn settings(&self) -> &OrbitCameraSettings {
        &self.settings
    }

    pub fn yaw(&self) -> Float {
        self.yaw
    }

    pub fn pitch(&self) -> Float {
        self.pitch
    }

    pub fn distance(&self) -> Float {
        self.distance
    }

    pub fn target_offset(&self) -> Vector3f {
        self.target_offset
    }

    pub fn position(&self) -> Vector3f {
        self.position
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.settings.auto_rotate
    }

    /// Orbiting wins when both buttons are held; both still apply.
    pub fn mode(&self) -> CameraMode {
        if self.orbiting {
            CameraMode::Orbiting
        } else if self.panning {
            CameraMode::Panning
        } else {
            CameraMode::Idle
        }
    }

    pub fn rotation(&self) -> Quaternionf {
        orbit_rotation(self.yaw, self.pitch)
    }

    /// Unsmoothed position the camera is converging to.
    pub fn desired_position(&self, target_position: Vector3f) -> Vector3f {
        let back = Vector3f::new(0.0, 0.0, -1.0);
        target_position + self.target_offset + self.rotation() * back * self.distance
    }

    /// Advances one control step and returns the displayed pose.
    pub fn update(&mut self, dt: Float, input: &CameraInput, target_position: Vector3f) -> CameraPose {
        self.handle_input(dt, input);

        let desired = self.desired_position(target_position);
        self.position = smooth_damp(self.position, desired, &mut self.velocity,
                                    self.settings.smooth_time, dt);
        self.pose(target_position)
    }

    pub fn pose(&self, target_position: Vector3f) -> CameraPose {
        CameraPose {
            position: self.position,
            target: target_position + self.target_offset,
            up: self.rotation() * Vector3f::y(),
        }
    }

    fn handle_input(&mut self, dt: Float, input: &CameraInput) {
        let (pressed, released) = self.orbit_edge.sample(input.orbit_button);
        if pressed {
            self.orbiting = true;
        }
        if released {
            self.orbiting = false;
        }

        if self.orbiting {
            let dx = input.pointer_delta.x * self.settings.orbit_speed * ORBIT_GAIN;
            let dy = input.pointer_delta.y * self.settings.orbit_speed * ORBIT_GAIN;
            self.yaw += dx;
            self.pitch -= if self.settings.invert_y { -dy } else { dy };
            self.clamp_pitch();
        }

        let (pressed, released) = self.pan_edge.sample(input.pan_button);
        if pressed {
            self.panning = true;
        }
        if released {
            self.panning = false;
        }

        if self.panning {
            let pan_x = -input.pointer_delta.x * self.settings.pan_speed * PAN_GAIN;
            let pan_y = -input.pointer_delta.y * self.settings.pan_speed * PAN_GAIN;
            let rotation = self.rotation();
            self.target_offset += rotation * Vector3f::x() * pan_x + rotation * Vector3f::y() * pan_y;
        }

        if input.scroll != 0.0 {
            self.distance -= input.scroll * self.settings.zoom_speed;
            let (lo, hi) = self.settings.distance_range();
            self.distance = clamp_between(self.distance, lo, hi);
        }

        if input.auto_rotate_key || self.settings.auto_rotate {
            self.yaw += self.settings.auto_rotate_speed * dt;
        }
    }

    fn clamp_pitch(&mut self) {
        if self.settings.limit_vertical_rotation {
            let (lo, hi) = self.settings.vertical_range();
            self.pitch = clamp_between(self.pitch, lo, hi);
        }
    }

    /// Teleports to the default pose.
    pub fn reset(&mut self) {
        self.position = self.settings.default_position;
        self.yaw = self.settings.default_rotation.y;
        self.pitch = wrap_degrees(self.settings.default_rotation.x);
        self.target_offset = self.settings.target_offset;
        self.distance = self.settings.initial_distance();
        self.velocity = Vector3f::zeros();
        log::info!("Camera reset to default position.");
    }

    pub fn focus_on_target(&mut self) {
        self.target_offset = self.settings.target_offset;
        self.distance = self.settings.initial_distance();
        log::info!("Camera focused on target.");
    }

    pub fn set_preset_view(&mut self, view: PresetView) {
        let (yaw, pitch) = view.angles();
        self.set_view_angles(yaw, pitch);
    }

    /// Jumps the orbit angles; the displayed position still smooths toward them.
    pub fn set_view_angles(&mut self, yaw: Float, pitch: Float) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.target_offset = self.settings.target_offset;
        log::info!("Camera view set to: H:{}° V:{}°", yaw, pitch);
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.settings.auto_rotate = !self.settings.auto_rotate;
        self.settings.auto_rotate
    }
}
