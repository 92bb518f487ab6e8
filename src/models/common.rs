//! 通用嵌入结构
//!
//! 规格表、武装分组等多个文档共用的嵌入类型。

use serde::{Deserialize, Serialize};

/// 规格表中的一行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

/// 有序的自由键值表
///
/// 保留录入顺序；同名键只保留一份，后写覆盖先写。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SpecTable(Vec<SpecEntry>);

impl SpecTable {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 写入一个键值，键比较忽略大小写与首尾空白
    pub fn set(&mut self, key: &str, value: &str) {
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return;
        }

        match self
            .0
            .iter_mut()
            .find(|e| e.key.eq_ignore_ascii_case(key))
        {
            Some(entry) => entry.value = value.to_string(),
            None => self.0.push(SpecEntry {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key.trim()))
            .map(|e| e.value.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self
            .0
            .iter()
            .position(|e| e.key.eq_ignore_ascii_case(key.trim()))?;
        Some(self.0.remove(idx).value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecEntry> {
        self.0.iter()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for SpecTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = SpecTable::new();
        for (k, v) in iter {
            table.set(k.as_ref(), v.as_ref());
        }
        table
    }
}

/// 武装分组（如 "Fixed Armaments" / "Optional Equipment"）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ArmamentGroup {
    /// 分组名称
    pub name: String,
    /// 分组内武装
    pub items: Vec<String>,
}

impl ArmamentGroup {
    pub fn new(name: &str, items: Vec<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            items,
        }
    }
}
