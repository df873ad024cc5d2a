//! 刚体代理
//!
//! 每个连杆对应一个代理，持有 Rapier 句柄和固定的碰撞形状。

use glam::Vec3;
use rapier3d::prelude::*;

use super::{from_isometry, to_isometry};
use crate::kinematics::{BodyKind, LinkSpec, ShapeDescriptor};
use crate::math::Pose;
use crate::{ArmError, Result};

/// 运动学刚体速度读数的舍入阈值（m/s），低于该值视为零
///
/// 瞬移后 Rapier 由相同的 position/next_position 求出的速度只剩浮点误差。
pub const KINEMATIC_VELOCITY_EPSILON: f32 = 1e-2;

/// 刚体 ID（在一个物理世界内唯一，不复用）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 刚体代理
#[derive(Clone, Debug)]
pub struct RigidBodyProxy {
    id: BodyId,
    name: String,
    kind: BodyKind,
    shape: ShapeDescriptor,
    /// Rapier 刚体句柄
    pub(crate) rigid_body_handle: RigidBodyHandle,
    /// Rapier 碰撞体句柄
    pub(crate) collider_handle: ColliderHandle,
}

impl RigidBodyProxy {
    /// 从连杆定义创建 Rapier 刚体和碰撞体
    pub(crate) fn build(
        id: BodyId,
        link: &LinkSpec,
        initial: Pose,
        bodies: &mut RigidBodySet,
        colliders: &mut ColliderSet,
    ) -> Self {
        let builder = match link.body_kind() {
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let rigid_body_handle = bodies.insert(builder.position(to_isometry(&initial)).build());

        let mut collider = match link.shape() {
            ShapeDescriptor::Box { size } => {
                ColliderBuilder::cuboid(size.x * 0.5, size.y * 0.5, size.z * 0.5)
            }
            ShapeDescriptor::Cylinder { radius, height } => ColliderBuilder::cylinder(height * 0.5, radius),
        };
        if link.body_kind() == BodyKind::Dynamic && link.mass() > 0.0 {
            collider = collider.mass(link.mass());
        }
        let collider_handle = colliders.insert_with_parent(collider.build(), rigid_body_handle, bodies);

        Self {
            id,
            name: link.name().to_string(),
            kind: link.body_kind(),
            shape: link.shape(),
            rigid_body_handle,
            collider_handle,
        }
    }

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[inline]
    pub fn shape(&self) -> ShapeDescriptor {
        self.shape
    }

    /// 瞬移运动学刚体
    ///
    /// 直接设置位置而不是 next_kinematic_position，不注入速度；
    /// 同一帧内重复调用结果不变。
    pub fn set_pose(&self, bodies: &mut RigidBodySet, pose: Pose) -> Result<()> {
        if self.kind != BodyKind::Kinematic {
            return Err(ArmError::InvalidBodyKind {
                name: self.name.clone(),
                kind: self.kind,
            });
        }
        let rb = bodies
            .get_mut(self.rigid_body_handle)
            .ok_or(ArmError::UnknownBody(self.id))?;
        rb.set_position(to_isometry(&pose), true);
        Ok(())
    }

    /// 读取当前位姿
    pub fn read_pose(&self, bodies: &RigidBodySet) -> Result<Pose> {
        let rb = bodies
            .get(self.rigid_body_handle)
            .ok_or(ArmError::UnknownBody(self.id))?;
        Ok(from_isometry(rb.position()))
    }

    /// 线速度（引擎读数）
    ///
    /// 运动学刚体的读数低于 [`KINEMATIC_VELOCITY_EPSILON`] 时舍为零；
    /// 若位姿是被推动而不是瞬移的，这里会读到真实速度。
    pub fn linear_velocity(&self, bodies: &RigidBodySet) -> Result<Vec3> {
        let rb = bodies
            .get(self.rigid_body_handle)
            .ok_or(ArmError::UnknownBody(self.id))?;
        let v = rb.linvel();
        let v = Vec3::new(v.x, v.y, v.z);
        if self.kind == BodyKind::Kinematic && v.length() < KINEMATIC_VELOCITY_EPSILON {
            return Ok(Vec3::ZERO);
        }
        Ok(v)
    }
}
