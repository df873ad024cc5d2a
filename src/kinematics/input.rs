//! 输入源
//!
//! 用户控件和时间函数走同一条 ControlInput 路径，运动学计算完全一致。

use std::sync::{Arc, RwLock};

use super::{ControlInput, ControlUpdate};
use crate::physics::get_config;

/// 输入源 trait：每帧采样一次，返回一致的输入快照
pub trait InputSource {
    /// 采样当前输入，`elapsed` 为场景启动后的秒数
    fn sample(&mut self, elapsed: f32) -> ControlInput;
}

// ============================================================================
// 手动输入（滑块）
// ============================================================================

/// 手动输入：保存最近一次用户设置的值，并按配置范围钳制
#[derive(Clone, Debug)]
pub struct ManualInput {
    current: ControlInput,
    offset_limit: f32,
    rotation_limit_deg: f32,
}

impl ManualInput {
    /// 使用全局配置中的输入范围
    pub fn new() -> Self {
        let config = get_config();
        Self::with_limits(config.offset_limit, config.rotation_limit_deg)
    }

    pub fn with_limits(offset_limit: f32, rotation_limit_deg: f32) -> Self {
        Self {
            current: ControlInput::default(),
            offset_limit,
            rotation_limit_deg,
        }
    }

    /// 应用一次用户交互
    pub fn update(&mut self, update: &ControlUpdate) {
        self.current.apply(update);
        self.current = self.current.clamped(self.offset_limit, self.rotation_limit_deg);
    }

    #[inline]
    pub fn current(&self) -> ControlInput {
        self.current
    }
}

impl Default for ManualInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ManualInput {
    fn sample(&mut self, _elapsed: f32) -> ControlInput {
        self.current
    }
}

// ============================================================================
// 时间驱动输入（环绕）
// ============================================================================

/// 时间驱动输入：控制器以恒定角速度绕竖直轴旋转
///
/// 连杆偏移为 (0, y, L) 时，世界位置为 (L sin t, y, L cos t)。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitInput {
    pub forward_offset: f32,
    pub lateral_offset: f32,
    /// 角速度（度/秒）
    pub angular_speed_deg: f32,
    /// 初始相位（度）
    pub phase_deg: f32,
}

impl OrbitInput {
    pub fn new(angular_speed_deg: f32) -> Self {
        Self {
            forward_offset: 0.0,
            lateral_offset: 0.0,
            angular_speed_deg,
            phase_deg: 0.0,
        }
    }

    pub fn with_phase(mut self, phase_deg: f32) -> Self {
        self.phase_deg = phase_deg;
        self
    }
}

impl InputSource for OrbitInput {
    fn sample(&mut self, elapsed: f32) -> ControlInput {
        // 折回 [0, 360)，避免长时间运行后 f32 精度丢失
        let rotation_deg = (self.phase_deg + self.angular_speed_deg * elapsed).rem_euclid(360.0);
        ControlInput::new(self.forward_offset, self.lateral_offset, rotation_deg)
    }
}

// ============================================================================
// 跨线程输入交接
// ============================================================================

/// 单写单读的输入交接（宿主在不同线程上渲染和模拟时使用）
///
/// 每次 `sample` 返回一份完整拷贝，tick 期间不会看到一半新一半旧的输入。
#[derive(Clone, Debug, Default)]
pub struct SharedInput {
    inner: Arc<RwLock<ControlInput>>,
}

impl SharedInput {
    pub fn new(initial: ControlInput) -> Self {
        Self { inner: Arc::new(RwLock::new(initial)) }
    }

    pub fn set(&self, input: ControlInput) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = input;
    }

    pub fn update(&self, update: &ControlUpdate) {
        self.inner.write().unwrap_or_else(|e| e.into_inner()).apply(update);
    }

    pub fn snapshot(&self) -> ControlInput {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl InputSource for SharedInput {
    fn sample(&mut self, _elapsed: f32) -> ControlInput {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{KinematicChain, LinkSpec, ShapeDescriptor};
    use crate::math::Transform;
    use glam::Vec3;

    #[test]
    fn test_manual_input_clamps() {
        let mut input = ManualInput::with_limits(80.0, 180.0);
        input.update(&ControlUpdate {
            forward_offset: Some(120.0),
            lateral_offset: Some(-95.0),
            rotation_deg: Some(-270.0),
        });
        assert_eq!(input.sample(0.0), ControlInput::new(80.0, -80.0, -180.0));

        input.update(&ControlUpdate {
            rotation_deg: Some(45.0),
            ..Default::default()
        });
        assert_eq!(input.current(), ControlInput::new(80.0, -80.0, 45.0));
    }

    #[test]
    fn test_manual_input_uses_config_limits() {
        let config = get_config();
        let mut input = ManualInput::new();
        input.update(&ControlUpdate {
            forward_offset: Some(config.offset_limit + 10.0),
            lateral_offset: Some(-config.offset_limit - 10.0),
            rotation_deg: Some(config.rotation_limit_deg + 90.0),
        });
        assert_eq!(
            input.current(),
            ControlInput::new(config.offset_limit, -config.offset_limit, config.rotation_limit_deg)
        );
    }

    #[test]
    fn test_orbit_matches_circular_path() {
        let radius = 2.0_f32.sqrt();
        let chain = KinematicChain::new(vec![LinkSpec::kinematic(
            "orbiter",
            Transform::translation(Vec3::new(0.0, 0.5, radius)),
            ShapeDescriptor::cube(1.0),
        )])
        .unwrap();

        // 1 rad/s
        let mut orbit = OrbitInput::new(1.0_f32.to_degrees());
        for t in [0.0_f32, 0.5, 1.3, 4.0] {
            let input = orbit.sample(t);
            let pos = chain.compute(&input).get("orbiter").unwrap().position();
            let expected = Vec3::new(radius * t.sin(), 0.5, radius * t.cos());
            assert!(pos.abs_diff_eq(expected, 1e-4), "t={t}: {pos} vs {expected}");
        }
    }

    #[test]
    fn test_orbit_wraps_rotation() {
        let mut orbit = OrbitInput::new(90.0).with_phase(10.0);
        let input = orbit.sample(4.0);
        assert!((input.rotation_deg - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_shared_input_snapshot() {
        let shared = SharedInput::new(ControlInput::new(1.0, 2.0, 3.0));
        let mut reader = shared.clone();
        let a = reader.sample(0.0);
        shared.update(&ControlUpdate {
            rotation_deg: Some(90.0),
            ..Default::default()
        });
        // 已取出的快照不受后续写入影响
        assert_eq!(a, ControlInput::new(1.0, 2.0, 3.0));
        assert_eq!(reader.sample(0.0), ControlInput::new(1.0, 2.0, 90.0));
    }
}
