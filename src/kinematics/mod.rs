//! 运动学系统
//!
//! 两级固定层次：控制器坐标系 → 连杆局部偏移。
//! - ControlInput: 每帧一份的控制输入快照
//! - LinkSpec: 连杆定义（创建后不可变）
//! - KinematicChain: 正向运动学求解
//! - InputSource: 手动/时间驱动/跨线程输入源

mod chain;
mod input;

pub use chain::{KinematicChain, WorldTransforms};
pub use input::{InputSource, ManualInput, OrbitInput, SharedInput};

use glam::Vec3;

use crate::math::Transform;

// ============================================================================
// 控制输入
// ============================================================================

/// 控制输入（前向偏移、侧向偏移、旋转角度）
///
/// 任意有限值都合法，取值范围由 UI 侧配置约束。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    pub forward_offset: f32,
    pub lateral_offset: f32,
    /// 绕竖直轴旋转（度），正值从 +Y 俯视为逆时针
    pub rotation_deg: f32,
}

impl ControlInput {
    pub fn new(forward_offset: f32, lateral_offset: f32, rotation_deg: f32) -> Self {
        Self { forward_offset, lateral_offset, rotation_deg }
    }

    /// 控制器变换：`translation(forward, 0, lateral) * rotation_y(rotation)`
    pub fn controller_transform(&self) -> Transform {
        Transform::translation(Vec3::new(self.forward_offset, 0.0, self.lateral_offset))
            * Transform::rotation_y(self.rotation_deg.to_radians())
    }

    /// 钳制到 ±offset_limit / ±rotation_limit_deg
    pub fn clamped(&self, offset_limit: f32, rotation_limit_deg: f32) -> Self {
        let offset = offset_limit.abs();
        let rotation = rotation_limit_deg.abs();
        Self {
            forward_offset: self.forward_offset.clamp(-offset, offset),
            lateral_offset: self.lateral_offset.clamp(-offset, offset),
            rotation_deg: self.rotation_deg.clamp(-rotation, rotation),
        }
    }

    /// 应用配置式更新，只覆盖给出的字段
    pub fn apply(&mut self, update: &ControlUpdate) {
        if let Some(v) = update.forward_offset {
            self.forward_offset = v;
        }
        if let Some(v) = update.lateral_offset {
            self.lateral_offset = v;
        }
        if let Some(v) = update.rotation_deg {
            self.rotation_deg = v;
        }
    }
}

/// 配置式输入更新（None 表示不变）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlUpdate {
    pub forward_offset: Option<f32>,
    pub lateral_offset: Option<f32>,
    pub rotation_deg: Option<f32>,
}

// ============================================================================
// 连杆定义
// ============================================================================

/// 刚体类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// 位姿由 PoseSync 每帧写入（瞬移）
    Kinematic,
    /// 位姿由物理积分产生，只读
    Dynamic,
}

/// 碰撞形状（尺寸固定，与视觉缩放无关）
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeDescriptor {
    /// 长方体，size 为完整边长
    Box { size: Vec3 },
    /// 竖直圆柱
    Cylinder { radius: f32, height: f32 },
}

impl ShapeDescriptor {
    pub fn cube(edge: f32) -> Self {
        Self::Box { size: Vec3::splat(edge) }
    }
}

/// 连杆定义
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
    name: String,
    local_offset: Transform,
    body_kind: BodyKind,
    shape: ShapeDescriptor,
    mass: f32,
}

impl LinkSpec {
    pub fn new(
        name: impl Into<String>,
        local_offset: Transform,
        body_kind: BodyKind,
        shape: ShapeDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            local_offset,
            body_kind,
            shape,
            mass: 1.0,
        }
    }

    pub fn kinematic(name: impl Into<String>, local_offset: Transform, shape: ShapeDescriptor) -> Self {
        Self::new(name, local_offset, BodyKind::Kinematic, shape)
    }

    pub fn dynamic(name: impl Into<String>, local_offset: Transform, shape: ShapeDescriptor) -> Self {
        Self::new(name, local_offset, BodyKind::Dynamic, shape)
    }

    /// 质量（只对动态刚体生效）
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn local_offset(&self) -> Transform {
        self.local_offset
    }

    #[inline]
    pub fn body_kind(&self) -> BodyKind {
        self.body_kind
    }

    #[inline]
    pub fn shape(&self) -> ShapeDescriptor {
        self.shape
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }
}
