//! 4x4 仿射变换
//!
//! 组合顺序：`world = parent * local`，先在局部空间应用 local，再应用 parent。
//! 例：`rotation_y(90°) * translation(d, 0, 0)` 把点放到 (0, 0, -d)；
//! 反过来 `translation(d, 0, 0) * rotation_y(90°)` 只会平移到 (d, 0, 0)。

use std::ops::Mul;

use glam::{Mat3, Mat4, Quat, Vec3};

use super::Pose;
use crate::{ArmError, Result};

/// 缩放分量下限，低于此值视为零缩放
const SCALE_EPSILON: f32 = 1e-6;
/// 基向量正交性容差
const ORTHOGONAL_EPSILON: f32 = 1e-4;
/// 最后一行 (0, 0, 0, 1) 的容差
const AFFINE_EPSILON: f32 = 1e-6;

/// 仿射变换（平移 + 旋转 + 缩放）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { matrix: Mat4::IDENTITY };

    #[inline]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// 纯平移
    #[inline]
    pub fn translation(v: Vec3) -> Self {
        Self { matrix: Mat4::from_translation(v) }
    }

    /// 绕竖直轴（Y）旋转，正角度从 +Y 俯视为逆时针
    #[inline]
    pub fn rotation_y(radians: f32) -> Self {
        Self { matrix: Mat4::from_rotation_y(radians) }
    }

    /// 绕任意轴旋转（轴会被归一化）
    pub fn rotation_axis(axis: Vec3, radians: f32) -> Self {
        Self::from_rotation(Quat::from_axis_angle(axis.normalize(), radians))
    }

    #[inline]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self { matrix: Mat4::from_quat(rotation) }
    }

    #[inline]
    pub fn from_pose(pose: &Pose) -> Self {
        Self { matrix: pose.to_matrix() }
    }

    #[inline]
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// 组合：返回 `self * local`
    #[inline]
    pub fn compose(&self, local: &Transform) -> Transform {
        Self { matrix: self.matrix * local.matrix }
    }

    /// 变换一个点
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// 平移分量
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// 各轴缩放（基向量长度），不参与物理位姿
    pub fn scale(&self) -> Vec3 {
        Vec3::new(
            self.matrix.x_axis.truncate().length(),
            self.matrix.y_axis.truncate().length(),
            self.matrix.z_axis.truncate().length(),
        )
    }

    /// 分解为位姿
    ///
    /// 只接受由平移、旋转、正缩放组合出的矩阵。零缩放、剪切、镜像、
    /// 投影行或非有限值都返回 `DegenerateTransform`。
    pub fn decompose(&self) -> Result<Pose> {
        let m = self.matrix;
        if !m.is_finite() {
            return Err(ArmError::DegenerateTransform("non-finite element".to_string()));
        }

        let bottom = [m.x_axis.w, m.y_axis.w, m.z_axis.w, m.w_axis.w - 1.0];
        if bottom.iter().any(|v| v.abs() > AFFINE_EPSILON) {
            return Err(ArmError::DegenerateTransform("projective bottom row".to_string()));
        }

        let basis = Mat3::from_mat4(m);
        let scale = self.scale();
        if scale.min_element() < SCALE_EPSILON {
            return Err(ArmError::DegenerateTransform(format!("zero scale {scale}")));
        }

        let x = basis.x_axis / scale.x;
        let y = basis.y_axis / scale.y;
        let z = basis.z_axis / scale.z;
        if x.dot(y).abs() > ORTHOGONAL_EPSILON
            || y.dot(z).abs() > ORTHOGONAL_EPSILON
            || z.dot(x).abs() > ORTHOGONAL_EPSILON
        {
            return Err(ArmError::DegenerateTransform("non-orthogonal basis".to_string()));
        }
        if basis.determinant() <= 0.0 {
            return Err(ArmError::DegenerateTransform("mirrored basis".to_string()));
        }

        let orientation = Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize();
        Ok(Pose::new(m.w_axis.truncate(), orientation))
    }
}

impl Mul for Transform {
    type Output = Transform;

    #[inline]
    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}
