//! 场景编排
//!
//! 一帧的顺序固定：PoseSync::tick（写入运动学位姿）→ advance(dt)（动态积分）
//! → 渲染侧读取快照。物理步进看到的是本帧的障碍物位置，而不是上一帧。

use glam::Vec3;

use super::{BodyRegistry, PoseSync};
use crate::kinematics::{
    BodyKind, ControlInput, InputSource, KinematicChain, LinkSpec, OrbitInput, ShapeDescriptor,
};
use crate::math::Transform;
use crate::physics::{PhysicsBackend, SimulationWorld};
use crate::Result;

/// 渲染快照条目（只读）
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    pub name: String,
    pub kind: BodyKind,
    pub shape: ShapeDescriptor,
    pub transform: Transform,
}

/// 场景：运动学链 + 物理世界 + 注册表
pub struct Scene<B: PhysicsBackend = SimulationWorld> {
    chain: KinematicChain,
    backend: B,
    registry: BodyRegistry,
    pose_sync: PoseSync,
    /// 场景启动后经过的时间（秒）
    elapsed: f32,
}

impl Scene<SimulationWorld> {
    /// 使用全局配置创建物理世界并构建场景
    pub fn new(chain: KinematicChain, initial: ControlInput) -> Result<Self> {
        Self::with_backend(chain, SimulationWorld::new(), initial)
    }

    /// 演示场景：地面 + 环绕的运动学方块 + 一个动态方块
    pub fn demo() -> Result<Self> {
        let mut input = demo_input();
        Self::new(demo_chain()?, input.sample(0.0))
    }
}

impl<B: PhysicsBackend> Scene<B> {
    /// 构建场景
    ///
    /// 按初始输入求解一次运动学链，每个连杆在其初始世界位姿处创建刚体。
    pub fn with_backend(chain: KinematicChain, mut backend: B, initial: ControlInput) -> Result<Self> {
        let mut registry = BodyRegistry::new();
        {
            let world = chain.compute(&initial);
            for (link, transform) in world.iter() {
                let id = backend.create_body(link, transform.decompose()?)?;
                registry.register(link.name(), id)?;
            }
        }

        let kinematic_count = chain
            .links()
            .iter()
            .filter(|l| l.body_kind() == BodyKind::Kinematic)
            .count();
        log::info!(
            "[场景] 构建完成: {} 连杆 ({} 运动学 + {} 动态)",
            chain.len(),
            kinematic_count,
            chain.len() - kinematic_count
        );

        Ok(Self {
            chain,
            backend,
            registry,
            pose_sync: PoseSync::new(),
            elapsed: 0.0,
        })
    }

    /// 推进一帧：先同步运动学位姿，再步进物理
    ///
    /// 同步失败时直接返回错误，本帧不步进物理。
    pub fn frame(&mut self, input: ControlInput, dt: f32) -> Result<()> {
        self.pose_sync
            .tick(&self.chain, input, &self.registry, &mut self.backend)?;
        self.backend.advance(dt);
        self.elapsed += dt.max(0.0);
        Ok(())
    }

    /// 从输入源采样一次并推进一帧，返回本帧使用的输入
    pub fn frame_from(&mut self, source: &mut dyn InputSource, dt: f32) -> Result<ControlInput> {
        let input = source.sample(self.elapsed);
        self.frame(input, dt)?;
        Ok(input)
    }

    /// 渲染快照：每个连杆的形状和当前世界变换
    pub fn render_snapshot(&self) -> Result<Vec<RenderItem>> {
        self.chain
            .links()
            .iter()
            .map(|link| -> Result<RenderItem> {
                let id = self.registry.resolve(link.name())?;
                let pose = self.backend.read_pose(id)?;
                Ok(RenderItem {
                    name: link.name().to_string(),
                    kind: link.body_kind(),
                    shape: link.shape(),
                    transform: Transform::from_pose(&pose),
                })
            })
            .collect()
    }

    #[inline]
    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    #[inline]
    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.pose_sync.frame_count()
    }
}

impl<B: PhysicsBackend> Drop for Scene<B> {
    fn drop(&mut self) {
        let mut failed = 0;
        for link in self.chain.links() {
            if let Some(id) = self.registry.unregister(link.name()) {
                if self.backend.remove_body(id).is_err() {
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            log::warn!("[场景] 卸载时 {} 个刚体移除失败", failed);
        }
    }
}

// ============================================================================
// 演示场景
// ============================================================================

/// 环绕半径：原始静态方块位于 (1, 0.5, 1)
const DEMO_ORBIT_RADIUS: f32 = std::f32::consts::SQRT_2;

/// 演示运动学链
///
/// - orbiter: 1×1×1 运动学方块，偏移 (0, 0.5, √2)，随控制器旋转做圆周运动
/// - box: 1×1×1 动态方块，质量 1，初始位于 (-1, 0.5, -1)
pub fn demo_chain() -> Result<KinematicChain> {
    KinematicChain::new(vec![
        LinkSpec::kinematic(
            "orbiter",
            Transform::translation(Vec3::new(0.0, 0.5, DEMO_ORBIT_RADIUS)),
            ShapeDescriptor::cube(1.0),
        ),
        LinkSpec::dynamic(
            "box",
            Transform::translation(Vec3::new(-1.0, 0.5, -1.0)),
            ShapeDescriptor::cube(1.0),
        )
        .with_mass(1.0),
    ])
}

/// 演示输入：1 rad/s 匀速环绕
pub fn demo_input() -> OrbitInput {
    OrbitInput::new(1.0_f32.to_degrees())
}
