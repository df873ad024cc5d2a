//! 每帧位姿同步
//!
//! 流程：compute → 校验并分解所有运动学连杆 → 统一写入。
//! 任一连杆失败时整帧失败，不写入任何位姿。

use super::BodyRegistry;
use crate::kinematics::{BodyKind, ControlInput, KinematicChain};
use crate::math::Pose;
use crate::physics::{get_config, BodyId, PhysicsBackend};
use crate::{ArmError, Result};

/// 每帧位姿同步驱动
#[derive(Debug)]
pub struct PoseSync {
    /// 待写入位姿缓冲区（复用内存）
    pending: Vec<(BodyId, Pose)>,
    /// 成功完成的帧数
    frame_count: u64,
    debug_log: bool,
}

impl PoseSync {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            frame_count: 0,
            debug_log: get_config().debug_log,
        }
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 同步一帧，返回写入的运动学刚体数量
    ///
    /// `input` 按值传入，整帧只使用这一份快照。
    /// 动态连杆不写入，渲染侧自行读取。
    pub fn tick<B: PhysicsBackend + ?Sized>(
        &mut self,
        chain: &KinematicChain,
        input: ControlInput,
        registry: &BodyRegistry,
        backend: &mut B,
    ) -> Result<usize> {
        let world = chain.compute(&input);

        // 第一步：全部校验，失败时不产生任何写入
        self.pending.clear();
        for (link, transform) in world.iter() {
            let id = registry.resolve(link.name())?;
            if link.body_kind() != BodyKind::Kinematic {
                continue;
            }
            let kind = backend.body_kind(id)?;
            if kind != BodyKind::Kinematic {
                return Err(ArmError::InvalidBodyKind {
                    name: link.name().to_string(),
                    kind,
                });
            }
            self.pending.push((id, transform.decompose()?));
        }

        // 第二步：统一写入
        for &(id, pose) in &self.pending {
            backend.set_pose(id, pose)?;
        }

        self.frame_count += 1;
        if self.debug_log {
            log::debug!(
                "[同步] 第 {} 帧: 输入=({:.2}, {:.2}, {:.2}°), 写入 {} 个运动学刚体",
                self.frame_count,
                input.forward_offset,
                input.lateral_offset,
                input.rotation_deg,
                self.pending.len()
            );
        }
        Ok(self.pending.len())
    }
}

impl Default for PoseSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{LinkSpec, ShapeDescriptor};
    use crate::math::Transform;
    use glam::{Mat4, Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    /// 记录所有写入的测试后端
    #[derive(Default)]
    struct RecordingBackend {
        kinds: Vec<BodyKind>,
        poses: Vec<Pose>,
        writes: Vec<(BodyId, Pose)>,
    }

    impl PhysicsBackend for RecordingBackend {
        fn create_body(&mut self, link: &LinkSpec, initial: Pose) -> Result<BodyId> {
            self.kinds.push(link.body_kind());
            self.poses.push(initial);
            Ok(BodyId(self.kinds.len() as u32 - 1))
        }

        fn remove_body(&mut self, _id: BodyId) -> Result<()> {
            Ok(())
        }

        fn body_kind(&self, id: BodyId) -> Result<BodyKind> {
            self.kinds.get(id.index()).copied().ok_or(ArmError::UnknownBody(id))
        }

        fn set_pose(&mut self, id: BodyId, pose: Pose) -> Result<()> {
            self.writes.push((id, pose));
            self.poses[id.index()] = pose;
            Ok(())
        }

        fn read_pose(&self, id: BodyId) -> Result<Pose> {
            self.poses.get(id.index()).copied().ok_or(ArmError::UnknownBody(id))
        }

        fn linear_velocity(&self, _id: BodyId) -> Result<Vec3> {
            Ok(Vec3::ZERO)
        }

        fn advance(&mut self, _dt: f32) -> u32 {
            0
        }

        fn gravity(&self) -> Vec3 {
            Vec3::ZERO
        }
    }

    fn cube() -> ShapeDescriptor {
        ShapeDescriptor::cube(1.0)
    }

    /// 按连杆创建刚体并注册
    fn setup(chain: &KinematicChain) -> (RecordingBackend, BodyRegistry) {
        let mut backend = RecordingBackend::default();
        let mut registry = BodyRegistry::new();
        for link in chain.links() {
            let id = backend.create_body(link, Pose::IDENTITY).unwrap();
            registry.register(link.name(), id).unwrap();
        }
        (backend, registry)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let chain = KinematicChain::new(vec![LinkSpec::kinematic(
            "arm",
            Transform::translation(Vec3::new(15.0, 11.0, 0.0)),
            cube(),
        )])
        .unwrap();
        let (mut backend, registry) = setup(&chain);
        let id = registry.get("arm").unwrap();
        let mut sync = PoseSync::new();

        sync.tick(&chain, ControlInput::new(0.0, 0.0, 0.0), &registry, &mut backend).unwrap();
        let pose = backend.read_pose(id).unwrap();
        assert!(pose.abs_diff_eq(&Pose::new(Vec3::new(15.0, 11.0, 0.0), Quat::IDENTITY), 1e-6));

        // +90° 逆时针：(15, 11, 0) → (0, 11, -15)
        sync.tick(&chain, ControlInput::new(0.0, 0.0, 90.0), &registry, &mut backend).unwrap();
        let pose = backend.read_pose(id).unwrap();
        let expected = Pose::new(Vec3::new(0.0, 11.0, -15.0), Quat::from_rotation_y(FRAC_PI_2));
        assert!(pose.abs_diff_eq(&expected, 1e-5), "{pose:?}");
        assert_eq!(sync.frame_count(), 2);
    }

    #[test]
    fn test_dynamic_links_not_written() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("arm", Transform::translation(Vec3::X), cube()),
            LinkSpec::dynamic("box", Transform::translation(Vec3::Y), cube()),
        ])
        .unwrap();
        let (mut backend, registry) = setup(&chain);
        let mut sync = PoseSync::new();

        let written = sync.tick(&chain, ControlInput::default(), &registry, &mut backend).unwrap();
        assert_eq!(written, 1);
        assert_eq!(backend.writes.len(), 1);
        assert_eq!(backend.writes[0].0, registry.get("arm").unwrap());
    }

    #[test]
    fn test_unknown_link_performs_no_writes() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("a", Transform::translation(Vec3::X), cube()),
            LinkSpec::kinematic("b", Transform::translation(Vec3::Z), cube()),
        ])
        .unwrap();
        let (mut backend, mut registry) = setup(&chain);
        registry.unregister("b");
        let mut sync = PoseSync::new();

        let err = sync.tick(&chain, ControlInput::default(), &registry, &mut backend).unwrap_err();
        assert_eq!(err, ArmError::UnknownLink("b".to_string()));
        assert!(backend.writes.is_empty());
        assert_eq!(sync.frame_count(), 0);
    }

    #[test]
    fn test_unknown_dynamic_link_also_fails() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("a", Transform::identity(), cube()),
            LinkSpec::dynamic("b", Transform::identity(), cube()),
        ])
        .unwrap();
        let (mut backend, mut registry) = setup(&chain);
        registry.unregister("b");

        let err = PoseSync::new()
            .tick(&chain, ControlInput::default(), &registry, &mut backend)
            .unwrap_err();
        assert_eq!(err, ArmError::UnknownLink("b".to_string()));
        assert!(backend.writes.is_empty());
    }

    #[test]
    fn test_kinematic_link_bound_to_dynamic_body() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("a", Transform::identity(), cube()),
            LinkSpec::kinematic("b", Transform::identity(), cube()),
        ])
        .unwrap();
        let mut backend = RecordingBackend::default();
        let mut registry = BodyRegistry::new();
        let a = backend.create_body(&chain.links()[0], Pose::IDENTITY).unwrap();
        let b = backend
            .create_body(&LinkSpec::dynamic("b", Transform::identity(), cube()), Pose::IDENTITY)
            .unwrap();
        registry.register("a", a).unwrap();
        registry.register("b", b).unwrap();

        let err = PoseSync::new()
            .tick(&chain, ControlInput::default(), &registry, &mut backend)
            .unwrap_err();
        assert!(matches!(err, ArmError::InvalidBodyKind { kind: BodyKind::Dynamic, .. }));
        assert!(backend.writes.is_empty());
    }

    #[test]
    fn test_degenerate_offset_performs_no_writes() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("ok", Transform::translation(Vec3::X), cube()),
            LinkSpec::kinematic("flat", Transform::from_matrix(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0))), cube()),
        ])
        .unwrap();
        let (mut backend, registry) = setup(&chain);

        let err = PoseSync::new()
            .tick(&chain, ControlInput::default(), &registry, &mut backend)
            .unwrap_err();
        assert!(matches!(err, ArmError::DegenerateTransform(_)));
        assert!(backend.writes.is_empty());
    }

    #[test]
    fn test_coherent_snapshot_per_tick() {
        let chain = KinematicChain::new(vec![
            LinkSpec::kinematic("a", Transform::translation(Vec3::new(2.0, 0.0, 0.0)), cube()),
            LinkSpec::kinematic("b", Transform::translation(Vec3::new(0.0, 0.0, 3.0)), cube()),
        ])
        .unwrap();
        let (mut backend, registry) = setup(&chain);
        let mut sync = PoseSync::new();

        let input_a = ControlInput::new(1.0, 0.0, 0.0);
        let input_b = ControlInput::new(-4.0, 2.0, 90.0);
        for input in [input_a, input_b] {
            backend.writes.clear();
            sync.tick(&chain, input, &registry, &mut backend).unwrap();
            let controller = input.controller_transform();
            for (link, &(id, pose)) in chain.links().iter().zip(&backend.writes) {
                assert_eq!(Some(id), registry.get(link.name()));
                let expected = controller.compose(&link.local_offset()).decompose().unwrap();
                assert!(pose.abs_diff_eq(&expected, 1e-6));
            }
        }
    }

    #[test]
    fn test_repeated_tick_is_idempotent() {
        let chain = KinematicChain::new(vec![LinkSpec::kinematic(
            "static",
            Transform::translation(Vec3::new(1.0, 0.5, 1.0)),
            cube(),
        )])
        .unwrap();
        let (mut backend, registry) = setup(&chain);
        let mut sync = PoseSync::new();
        let id = registry.get("static").unwrap();

        sync.tick(&chain, ControlInput::default(), &registry, &mut backend).unwrap();
        let first = backend.read_pose(id).unwrap();
        sync.tick(&chain, ControlInput::default(), &registry, &mut backend).unwrap();
        let second = backend.read_pose(id).unwrap();

        // 每帧无条件同步，结果不累加
        assert_eq!(backend.writes.len(), 2);
        assert_eq!(first, second);
    }
}
