//! 骨骼层级
//!
//! 以数组存放骨骼节点，父骨骼用索引引用。构建时校验父骨骼存在且无环，
//! 并给出根在前、子在后的处理顺序。

use std::collections::{HashMap, VecDeque};

use glam::Vec3;

use crate::{MmdError, Result};

/// 骨骼节点
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    pub name: String,
    pub parent_index: Option<usize>,
    /// 初始姿态下的模型空间位置
    pub initial_position: Vec3,
    /// 相对父骨骼的偏移（根骨骼为零）
    pub bone_offset: Vec3,
}

/// 骨骼层级
#[derive(Debug, Clone, Default)]
pub struct BoneHierarchy {
    bones: Vec<BoneNode>,
    name_to_index: HashMap<String, usize>,
    /// 父骨骼总在子骨骼之前
    sorted_indices: Vec<usize>,
}

impl BoneHierarchy {
    /// 由 (骨骼名, 父骨骼名, 初始位置) 列表构建
    ///
    /// 父骨骼不存在、骨骼重名或存在环时返回错误。
    pub fn from_initial_positions(bones: &[(&str, Option<&str>, Vec3)]) -> Result<Self> {
        let mut name_to_index = HashMap::with_capacity(bones.len());
        for (i, (name, _, _)) in bones.iter().enumerate() {
            if name_to_index.insert(name.to_string(), i).is_some() {
                return Err(MmdError::Hierarchy(format!("骨骼重名: {}", name)));
            }
        }

        let mut nodes = Vec::with_capacity(bones.len());
        for (name, parent, position) in bones {
            let parent_index = match parent {
                Some(parent_name) => Some(*name_to_index.get(*parent_name).ok_or_else(|| {
                    MmdError::Hierarchy(format!(
                        "骨骼 {} 的父骨骼 {} 不存在",
                        name, parent_name
                    ))
                })?),
                None => None,
            };
            let bone_offset = match parent_index {
                Some(p) => *position - bones[p].2,
                None => Vec3::ZERO,
            };
            nodes.push(BoneNode {
                name: name.to_string(),
                parent_index,
                initial_position: *position,
                bone_offset,
            });
        }

        let sorted_indices = topological_order(&nodes)?;
        Ok(Self {
            bones: nodes,
            name_to_index,
            sorted_indices,
        })
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, index: usize) -> Option<&BoneNode> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[BoneNode] {
        &self.bones
    }

    /// 根在前的处理顺序
    pub fn sorted_indices(&self) -> &[usize] {
        &self.sorted_indices
    }

    /// 父骨骼名
    pub fn parent_name(&self, name: &str) -> Option<&str> {
        let index = self.find_bone_by_name(name)?;
        self.bones[index]
            .parent_index
            .map(|p| self.bones[p].name.as_str())
    }

    /// 相对父骨骼的偏移
    pub fn offset_from_parent(&self, name: &str) -> Option<Vec3> {
        self.find_bone_by_name(name).map(|i| self.bones[i].bone_offset)
    }
}

/// Kahn 拓扑排序，剩余未处理的骨骼即构成环
fn topological_order(nodes: &[BoneNode]) -> Result<Vec<usize>> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent_index {
            Some(p) => children[p].push(i),
            None => queue.push_back(i),
        }
    }

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        queue.extend(children[i].iter().copied());
    }

    if order.len() < nodes.len() {
        let mut visited = vec![false; nodes.len()];
        for &i in &order {
            visited[i] = true;
        }
        let cyclic: Vec<&str> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !visited[*i])
            .map(|(_, n)| n.name.as_str())
            .collect();
        return Err(MmdError::Hierarchy(format!("骨骼层级存在环: {:?}", cyclic)));
    }
    Ok(order)
}

/// 上半身 15 根骨骼：(名称, 父骨骼, 初始位置)
pub const STANDARD_BONES: [(&str, Option<&str>, [f32; 3]); 15] = [
    ("全ての親", None, [0.0, 0.0, 0.0]),
    ("センター", Some("全ての親"), [0.0, 8.0, 0.0]),
    ("グルーブ", Some("センター"), [0.0, 8.2, 0.0]),
    ("腰", Some("グルーブ"), [0.0, 12.0, 0.255]),
    ("上半身", Some("腰"), [0.0, 12.8, -0.5]),
    ("上半身2", Some("上半身"), [0.0, 13.9, -0.46]),
    ("首", Some("上半身2"), [0.0, 16.34, -0.11]),
    ("頭", Some("首"), [0.0, 17.2, -0.12]),
    ("顔", Some("頭"), [0.0, 17.8, -1.0]),
    ("右肩P", Some("上半身2"), [-0.235, 16.06, -0.15]),
    ("右肩", Some("右肩P"), [-0.235, 16.06, -0.15]),
    ("右腕", Some("右肩"), [-1.1, 15.8, -0.13]),
    ("左肩P", Some("上半身2"), [0.235, 16.06, -0.15]),
    ("左肩", Some("左肩P"), [0.235, 16.06, -0.15]),
    ("左腕", Some("左肩"), [1.1, 15.8, -0.13]),
];

/// 输出时的骨骼名映射（肩P 不输出）
pub const STANDARD_OUTPUT_NAMES: [(&str, &str); 13] = [
    ("全ての親", "parent of all"),
    ("センター", "center"),
    ("グルーブ", "groove"),
    ("腰", "waist"),
    ("上半身", "upper body"),
    ("上半身2", "upper body 2"),
    ("首", "neck"),
    ("頭", "head"),
    ("顔", "face"),
    ("右肩", "right shoulder"),
    ("右腕", "right arm"),
    ("左肩", "left shoulder"),
    ("左腕", "left arm"),
];

/// 标准上半身骨骼层级
pub fn standard_hierarchy() -> Result<BoneHierarchy> {
    let bones: Vec<(&str, Option<&str>, Vec3)> = STANDARD_BONES
        .iter()
        .map(|(name, parent, pos)| (*name, *parent, Vec3::from_array(*pos)))
        .collect();
    BoneHierarchy::from_initial_positions(&bones)
}
