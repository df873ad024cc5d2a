//! 物理系统模块
//!
//! 使用 Rapier3D 实现物理边界，核心同步逻辑只依赖 [`PhysicsBackend`] 契约。
//!
//! ## 刚体类型对应关系
//! | BodyKind | Rapier | 位姿写入方 |
//! |----------|--------|-----------|
//! | Kinematic | RigidBodyBuilder::kinematic_position_based() | PoseSync |
//! | Dynamic | RigidBodyBuilder::dynamic() | 物理积分 |

mod body;
pub mod config;
mod world;

pub use body::{BodyId, RigidBodyProxy};
pub use config::{get_config, reset_config, set_config, ArmConfig};
pub use world::SimulationWorld;

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{Isometry, Real};

use crate::kinematics::{BodyKind, LinkSpec};
use crate::math::Pose;
use crate::Result;

/// 物理边界契约
///
/// 运动学刚体的位姿由调用方写入；动态刚体的位姿由 `advance` 积分产生，只读。
pub trait PhysicsBackend {
    /// 按连杆定义创建刚体
    fn create_body(&mut self, link: &LinkSpec, initial: Pose) -> Result<BodyId>;

    /// 移除刚体（场景卸载）
    fn remove_body(&mut self, id: BodyId) -> Result<()>;

    /// 刚体类型
    fn body_kind(&self, id: BodyId) -> Result<BodyKind>;

    /// 强制设置位姿（仅运动学刚体，否则返回 `InvalidBodyKind`）
    fn set_pose(&mut self, id: BodyId, pose: Pose) -> Result<()>;

    /// 读取当前位姿
    fn read_pose(&self, id: BodyId) -> Result<Pose>;

    /// 线速度（运动学刚体瞬移后读数为零）
    fn linear_velocity(&self, id: BodyId) -> Result<Vec3>;

    /// 步进动态模拟，返回实际执行的子步数
    fn advance(&mut self, dt: f32) -> u32;

    /// 重力向量
    fn gravity(&self) -> Vec3;
}

/// 借用的后端：场景卸载后调用方仍持有物理世界
impl<B: PhysicsBackend + ?Sized> PhysicsBackend for &mut B {
    fn create_body(&mut self, link: &LinkSpec, initial: Pose) -> Result<BodyId> {
        (**self).create_body(link, initial)
    }

    fn remove_body(&mut self, id: BodyId) -> Result<()> {
        (**self).remove_body(id)
    }

    fn body_kind(&self, id: BodyId) -> Result<BodyKind> {
        (**self).body_kind(id)
    }

    fn set_pose(&mut self, id: BodyId, pose: Pose) -> Result<()> {
        (**self).set_pose(id, pose)
    }

    fn read_pose(&self, id: BodyId) -> Result<Pose> {
        (**self).read_pose(id)
    }

    fn linear_velocity(&self, id: BodyId) -> Result<Vec3> {
        (**self).linear_velocity(id)
    }

    fn advance(&mut self, dt: f32) -> u32 {
        (**self).advance(dt)
    }

    fn gravity(&self) -> Vec3 {
        (**self).gravity()
    }
}

/// 位姿 → Rapier 等距变换
pub(crate) fn to_isometry(pose: &Pose) -> Isometry<Real> {
    let q = pose.orientation.normalize();
    Isometry::from_parts(
        Translation3::new(pose.position.x, pose.position.y, pose.position.z),
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

/// Rapier 等距变换 → 位姿
pub(crate) fn from_isometry(iso: &Isometry<Real>) -> Pose {
    let t = iso.translation.vector;
    let q = iso.rotation.quaternion();
    Pose::new(Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.i, q.j, q.k, q.w))
}
