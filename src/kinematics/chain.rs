//! 运动学链 - 正向运动学
//!
//! 变换计算：link_world = controller * link.local_offset
//! 控制器旋转绕控制器自身原点甩动连杆偏移臂。

use std::collections::HashSet;

use super::{ControlInput, LinkSpec};
use crate::math::Transform;
use crate::{ArmError, Result};

/// 运动学链（控制器 → 连杆，深度固定为两级）
#[derive(Clone, Debug)]
pub struct KinematicChain {
    links: Vec<LinkSpec>,
}

impl KinematicChain {
    /// 创建运动学链，连杆名称必须唯一
    pub fn new(links: Vec<LinkSpec>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(links.len());
        for link in &links {
            if !seen.insert(link.name()) {
                return Err(ArmError::DuplicateLink(link.name().to_string()));
            }
        }
        Ok(Self { links })
    }

    #[inline]
    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// 求解所有连杆的世界变换
    ///
    /// 纯函数：只依赖传入的输入快照和固定的连杆定义。
    pub fn compute(&self, input: &ControlInput) -> WorldTransforms<'_> {
        let controller = input.controller_transform();
        let entries = self
            .links
            .iter()
            .map(|link| (link, controller.compose(&link.local_offset())))
            .collect();
        WorldTransforms { entries }
    }
}

/// 一帧的世界变换结果（按连杆定义顺序）
#[derive(Clone, Debug)]
pub struct WorldTransforms<'a> {
    entries: Vec<(&'a LinkSpec, Transform)>,
}

impl<'a> WorldTransforms<'a> {
    pub fn get(&self, name: &str) -> Option<Transform> {
        self.entries
            .iter()
            .find(|(link, _)| link.name() == name)
            .map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a LinkSpec, Transform)> + '_ {
        self.entries.iter().map(|(link, t)| (*link, *t))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
