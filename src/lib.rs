//! 机械臂运动学与物理位姿同步引擎
//!
//! 流程：输入源 → ControlInput → KinematicChain::compute → PoseSync::tick
//! → SimulationWorld::advance → 渲染快照。
//!
//! - math: 仿射变换与位姿
//! - kinematics: 控制输入、连杆定义、运动学链
//! - physics: 配置、物理边界 trait、Rapier 物理世界
//! - sync: 每帧位姿同步与场景编排

pub mod kinematics;
pub mod math;
pub mod physics;
pub mod sync;

use thiserror::Error;

pub use kinematics::{
    BodyKind, ControlInput, ControlUpdate, InputSource, KinematicChain, LinkSpec, ManualInput,
    OrbitInput, ShapeDescriptor, SharedInput,
};
pub use math::{Pose, Transform};
pub use physics::{
    get_config, reset_config, set_config, ArmConfig, BodyId, PhysicsBackend, RigidBodyProxy,
    SimulationWorld,
};
pub use sync::{BodyRegistry, PoseSync, RenderItem, Scene};

/// 引擎错误
///
/// 三类核心错误都属于编程/配置错误，当前帧直接失败，不重试、不回退默认位姿。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArmError {
    /// 对非运动学刚体强制设置位姿
    #[error("cannot force pose on {kind:?} body '{name}'")]
    InvalidBodyKind { name: String, kind: BodyKind },

    /// 运动学链引用了注册表中不存在的连杆
    #[error("link '{0}' has no registered body")]
    UnknownLink(String),

    /// 对非刚性矩阵做分解
    #[error("degenerate transform: {0}")]
    DegenerateTransform(String),

    /// 物理世界中不存在的刚体 ID
    #[error("unknown body id {0:?}")]
    UnknownBody(BodyId),

    /// 连杆名称重复
    #[error("duplicate link name '{0}'")]
    DuplicateLink(String),
}

pub type Result<T> = std::result::Result<T, ArmError>;
