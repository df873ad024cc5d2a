//! 引擎配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 物理世界在创建时读取一次配置，之后修改只影响新场景。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::kinematics::ControlInput;

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct ArmConfig {
    // ========== 重力 ==========
    /// 重力 Y 分量（负数向下），默认 -9.81
    pub gravity_y: f32,

    // ========== 模拟参数 ==========
    /// 物理 FPS，默认 60.0
    pub physics_fps: f32,
    /// 每帧最大子步数，默认 5
    pub max_substep_count: u32,

    // ========== 速度限制 ==========
    /// 动态刚体最大线速度 (m/s)，默认 50.0
    pub max_linear_velocity: f32,
    /// 动态刚体最大角速度 (rad/s)，默认 20.0
    pub max_angular_velocity: f32,

    // ========== 地面 ==========
    /// 是否创建静态地面，默认 true
    pub ground_enabled: bool,
    /// 地面高度，默认 0.0
    pub ground_height: f32,
    /// 地面摩擦系数，默认 0.5
    pub ground_friction: f32,

    // ========== 输入范围（仅 UI 侧使用）==========
    /// 前向/侧向偏移范围 ±offset_limit，默认 80.0
    pub offset_limit: f32,
    /// 旋转范围 ±rotation_limit_deg，默认 180.0
    pub rotation_limit_deg: f32,

    // ========== 调试 ==========
    /// 是否输出每帧调试日志，默认 false
    pub debug_log: bool,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.81,

            // 越高 → 模拟越精确，但 CPU 消耗越大
            physics_fps: 60.0,
            // 卡顿帧最多追 5 步，超出部分丢弃
            max_substep_count: 5,

            max_linear_velocity: 50.0,
            max_angular_velocity: 20.0,

            ground_enabled: true,
            ground_height: 0.0,
            ground_friction: 0.5,

            offset_limit: 80.0,
            rotation_limit_deg: 180.0,

            debug_log: false,
        }
    }
}

impl ArmConfig {
    /// 按输入范围钳制（核心计算本身不钳制）
    pub fn clamp_input(&self, input: ControlInput) -> ControlInput {
        input.clamped(self.offset_limit, self.rotation_limit_deg)
    }

    /// 固定步长（秒）
    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.physics_fps.max(1.0)
    }
}

/// 全局配置实例
static ARM_CONFIG: Lazy<RwLock<ArmConfig>> = Lazy::new(|| RwLock::new(ArmConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> ArmConfig {
    ARM_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: ArmConfig) {
    *ARM_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *ARM_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = ArmConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_input() {
        let config = ArmConfig::default();
        let clamped = config.clamp_input(ControlInput::new(100.0, -0.5, 720.0));
        assert_eq!(clamped, ControlInput::new(80.0, -0.5, 180.0));
    }

    #[test]
    fn test_fixed_dt() {
        let config = ArmConfig {
            physics_fps: 120.0,
            ..Default::default()
        };
        assert!((config.fixed_dt() - 1.0 / 120.0).abs() < 1e-9);
    }
}
