//! 数学基础 - 仿射变换与刚体位姿
//!
//! 内部统一使用四元数表示旋转，欧拉角只在 UI 边界做输入输出转换。

mod transform;

pub use transform::Transform;

use glam::{EulerRot, Mat4, Quat, Vec3};

// ============================================================================
// 位姿
// ============================================================================

/// 刚体位姿（位置 + 朝向），不含缩放
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// 欧拉角（度，YXZ 顺序），仅供 UI 显示
    pub fn euler_deg(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.orientation.to_euler(EulerRot::YXZ);
        Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
    }

    /// 到另一朝向的夹角（弧度，q 与 -q 视为同一朝向）
    ///
    /// 用 atan2 而不是 acos(dot)，小角度时不会被舍入误差放大。
    pub fn angle_to(&self, other: &Pose) -> f32 {
        let r = self.orientation.conjugate() * other.orientation;
        2.0 * r.xyz().length().atan2(r.w.abs())
    }

    /// 近似相等：位置按分量比较，朝向按夹角（弧度）比较
    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff) && self.angle_to(other) <= max_abs_diff
    }
}
