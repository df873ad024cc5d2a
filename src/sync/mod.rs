//! 位姿同步
//!
//! - BodyRegistry: 连杆名 → 刚体 ID
//! - PoseSync: 每帧把运动学连杆的世界位姿写入物理刚体
//! - Scene: 场景编排（建体、逐帧驱动、渲染快照、卸载）

mod pose_sync;
mod registry;
mod scene;

pub use pose_sync::PoseSync;
pub use registry::BodyRegistry;
pub use scene::{demo_chain, demo_input, RenderItem, Scene};
