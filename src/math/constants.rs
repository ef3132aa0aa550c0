/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f32;

pub type Vector2f = na::Vector2<Float>;
pub type Vector3f = na::Vector3<Float>;
pub type Point3f = na::Point3<Float>;
pub type Matrix4f = na::Matrix4<Float>;
pub type Quaternionf = na::UnitQuaternion<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = 3.14159265359;
pub const DEG_TO_RAD: Float = PI / 180.0;
