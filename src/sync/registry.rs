//! 刚体注册表

use std::collections::HashMap;

use crate::physics::BodyId;
use crate::{ArmError, Result};

/// 连杆名 → 刚体 ID
#[derive(Clone, Debug, Default)]
pub struct BodyRegistry {
    bodies: HashMap<String, BodyId>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册连杆，名称重复视为配置错误
    pub fn register(&mut self, name: impl Into<String>, id: BodyId) -> Result<()> {
        let name = name.into();
        if self.bodies.contains_key(&name) {
            return Err(ArmError::DuplicateLink(name));
        }
        self.bodies.insert(name, id);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<BodyId> {
        self.bodies.remove(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<BodyId> {
        self.bodies.get(name).copied()
    }

    /// 查找连杆，缺失返回 `UnknownLink`
    pub fn resolve(&self, name: &str) -> Result<BodyId> {
        self.get(name).ok_or_else(|| ArmError::UnknownLink(name.to_string()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
