//! 物理世界
//!
//! 持有 Rapier 流水线、重力和所有刚体代理。
//! 一个场景一个世界，场景重新挂载时重新创建。
//! 每帧流程：[运动学刚体写入位姿 → advance(dt) → 读取动态刚体位姿]

use glam::Vec3;
use rapier3d::prelude::*;

use super::body::{BodyId, RigidBodyProxy};
use super::config::{get_config, ArmConfig};
use super::PhysicsBackend;
use crate::kinematics::{BodyKind, LinkSpec};
use crate::math::Pose;
use crate::{ArmError, Result};

/// 累加器比较容差，避免 1/60 累加误差导致丢步
const STEP_EPSILON: f32 = 1e-6;

/// 物理世界（Rapier3D）
pub struct SimulationWorld {
    physics_pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// 地面刚体句柄
    ground_handle: Option<RigidBodyHandle>,
    /// 刚体代理（按 BodyId 索引，移除后留空）
    proxies: Vec<Option<RigidBodyProxy>>,
    gravity: Vector<Real>,
    max_substep_count: u32,
    /// 未消耗的时间
    accumulator: f32,
    max_linear_velocity: f32,
    max_angular_velocity: f32,
    debug_log: bool,
}

impl SimulationWorld {
    /// 使用全局配置创建物理世界
    pub fn new() -> Self {
        Self::with_config(&get_config())
    }

    /// 使用指定配置创建物理世界
    pub fn with_config(config: &ArmConfig) -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        let ground_handle = if config.ground_enabled {
            let ground = RigidBodyBuilder::fixed()
                .translation(vector![0.0, config.ground_height, 0.0])
                .build();
            let handle = rigid_body_set.insert(ground);
            let collider = ColliderBuilder::halfspace(Vector::y_axis())
                .friction(config.ground_friction)
                .build();
            collider_set.insert_with_parent(collider, handle, &mut rigid_body_set);
            Some(handle)
        } else {
            None
        };

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_dt();

        log::info!(
            "[物理] 世界创建: FPS={}, 重力Y={}, 最大子步={}, 地面={}",
            config.physics_fps,
            config.gravity_y,
            config.max_substep_count,
            config.ground_enabled
        );

        Self {
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground_handle,
            proxies: Vec::new(),
            gravity: vector![0.0, config.gravity_y, 0.0],
            max_substep_count: config.max_substep_count,
            accumulator: 0.0,
            max_linear_velocity: config.max_linear_velocity,
            max_angular_velocity: config.max_angular_velocity,
            debug_log: config.debug_log,
        }
    }

    /// 设置重力
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = vector![gravity.x, gravity.y, gravity.z];
    }

    #[inline]
    pub fn has_ground(&self) -> bool {
        self.ground_handle.is_some()
    }

    /// 获取刚体代理
    pub fn proxy(&self, id: BodyId) -> Result<&RigidBodyProxy> {
        self.proxies
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ArmError::UnknownBody(id))
    }

    /// 所有存活的刚体代理
    pub fn proxies(&self) -> impl Iterator<Item = &RigidBodyProxy> {
        self.proxies.iter().flatten()
    }

    pub fn body_count(&self) -> usize {
        self.proxies().count()
    }

    /// 单个固定步长
    fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// 限制动态刚体速度，防止卡顿帧后物理爆炸
    fn clamp_velocities(&mut self) {
        for proxy in self.proxies.iter().flatten() {
            if proxy.kind() != BodyKind::Dynamic {
                continue;
            }
            if let Some(rb) = self.rigid_body_set.get_mut(proxy.rigid_body_handle) {
                let linvel = *rb.linvel();
                let lin = linvel.norm();
                if lin > self.max_linear_velocity {
                    log::warn!("[物理] 刚体 '{}' 线速度 {:.2} 超限，已钳制", proxy.name(), lin);
                    rb.set_linvel(linvel * (self.max_linear_velocity / lin), true);
                }

                let angvel = *rb.angvel();
                let ang = angvel.norm();
                if ang > self.max_angular_velocity {
                    rb.set_angvel(angvel * (self.max_angular_velocity / ang), true);
                }
            }
        }
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for SimulationWorld {
    fn create_body(&mut self, link: &LinkSpec, initial: Pose) -> Result<BodyId> {
        let id = BodyId(self.proxies.len() as u32);
        let proxy = RigidBodyProxy::build(
            id,
            link,
            initial,
            &mut self.rigid_body_set,
            &mut self.collider_set,
        );

        log::info!(
            "[物理] 创建刚体 '{}': 类型={:?}, 形状={:?}, 初始位置=({:.2},{:.2},{:.2})",
            link.name(),
            link.body_kind(),
            link.shape(),
            initial.position.x,
            initial.position.y,
            initial.position.z
        );

        self.proxies.push(Some(proxy));
        Ok(id)
    }

    fn remove_body(&mut self, id: BodyId) -> Result<()> {
        let proxy = self
            .proxies
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(ArmError::UnknownBody(id))?;
        // 先拆碰撞体并唤醒接触中的刚体，再移除刚体本身
        self.collider_set.remove(
            proxy.collider_handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        self.rigid_body_set.remove(
            proxy.rigid_body_handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            false,
        );
        if self.debug_log {
            log::debug!("[物理] 移除刚体 '{}' ({:?})", proxy.name(), id);
        }
        Ok(())
    }

    fn body_kind(&self, id: BodyId) -> Result<BodyKind> {
        Ok(self.proxy(id)?.kind())
    }

    fn set_pose(&mut self, id: BodyId, pose: Pose) -> Result<()> {
        let proxy = self
            .proxies
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ArmError::UnknownBody(id))?;
        proxy.set_pose(&mut self.rigid_body_set, pose)
    }

    fn read_pose(&self, id: BodyId) -> Result<Pose> {
        self.proxy(id)?.read_pose(&self.rigid_body_set)
    }

    fn linear_velocity(&self, id: BodyId) -> Result<Vec3> {
        self.proxy(id)?.linear_velocity(&self.rigid_body_set)
    }

    /// 固定步长子步进：累加时间，每次消耗 1/fps，最多 max_substep_count 步，
    /// 超出部分丢弃
    fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        let fixed_dt = self.integration_parameters.dt;
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator + STEP_EPSILON >= fixed_dt && steps < self.max_substep_count {
            self.step();
            self.accumulator = (self.accumulator - fixed_dt).max(0.0);
            steps += 1;
        }

        if self.accumulator + STEP_EPSILON >= fixed_dt {
            if self.debug_log {
                log::debug!("[物理] 子步数达到上限 {}，丢弃 {:.4}s", self.max_substep_count, self.accumulator);
            }
            self.accumulator = 0.0;
        }

        if steps > 0 {
            self.clamp_velocities();
        }
        steps
    }

    fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }
}
