//! 將 JSON-stat 2.0 資料集解碼成順序明確的 [`Cube`]
//!
//! 維度順序取自資料集的 `id` 陣列 (JSON-stat 的 row-major 順序)，
//! 沒有 `id` 時使用 `dimension` 的文件順序。類別順序取自 `category.index`，
//! 沒有時使用 `category.label` 的順序。

use crate::core::flatten::flatten_cube;
use crate::domain::model::{Cube, Dimension, DimensionNaming, Record};
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonStatDataset {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub id: Option<Vec<String>>,
    #[serde(default)]
    pub size: Option<Vec<usize>>,
    pub dimension: Map<String, Value>,
    pub value: JsonStatValues,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonStatValues {
    Dense(Vec<Option<f64>>),
    /// 位置 (字串鍵) -> 數值；未出現的位置視為缺值
    Sparse(HashMap<String, Option<f64>>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawDimension {
    #[serde(default)]
    label: Option<String>,
    category: RawCategory,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCategory {
    #[serde(default)]
    index: Option<CategoryIndex>,
    #[serde(default)]
    label: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CategoryIndex {
    Codes(Vec<String>),
    Positions(HashMap<String, usize>),
}

impl JsonStatDataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// 建立有序的立方體；除稀疏格式外，數值數量尚未與形狀比對
    pub fn to_cube(&self, naming: DimensionNaming) -> Result<Cube> {
        let ids: Vec<String> = match &self.id {
            Some(ids) => ids.clone(),
            None => self.dimension.keys().cloned().collect(),
        };

        let mut dimensions = Vec::with_capacity(ids.len());
        for id in &ids {
            let raw = self.dimension.get(id).ok_or_else(|| EtlError::InvalidCube {
                message: format!("dimension '{}' listed in id but not described", id),
            })?;
            let raw: RawDimension = serde_json::from_value(raw.clone())?;

            let name = match naming {
                DimensionNaming::Label => raw.label.clone().unwrap_or_else(|| id.clone()),
                DimensionNaming::Id => id.clone(),
            };
            dimensions.push(Dimension {
                name,
                categories: ordered_labels(id, &raw.category)?,
            });
        }

        if let Some(size) = &self.size {
            let shape: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
            if *size != shape {
                return Err(EtlError::InvalidCube {
                    message: format!(
                        "declared size {:?} does not match category counts {:?}",
                        size, shape
                    ),
                });
            }
        }

        let values = match &self.value {
            JsonStatValues::Dense(values) => values.clone(),
            JsonStatValues::Sparse(cells) => expand_sparse(&dimensions, cells)?,
        };

        Ok(Cube { dimensions, values })
    }

    pub fn to_records(&self, naming: DimensionNaming) -> Result<Vec<Record>> {
        flatten_cube(&self.to_cube(naming)?)
    }
}

/// 解析 JSON-stat 內容並直接攤平
pub fn decode_records(bytes: &[u8], naming: DimensionNaming) -> Result<Vec<Record>> {
    JsonStatDataset::from_slice(bytes)?.to_records(naming)
}

fn ordered_labels(dimension_id: &str, category: &RawCategory) -> Result<Vec<String>> {
    let codes: Vec<String> = match &category.index {
        Some(CategoryIndex::Codes(codes)) => codes.clone(),
        Some(CategoryIndex::Positions(positions)) => {
            let mut slots: Vec<Option<String>> = vec![None; positions.len()];
            for (code, position) in positions {
                match slots.get_mut(*position) {
                    Some(slot) if slot.is_none() => *slot = Some(code.clone()),
                    _ => {
                        return Err(EtlError::InvalidCube {
                            message: format!(
                                "dimension '{}' has an invalid category position {} for '{}'",
                                dimension_id, position, code
                            ),
                        })
                    }
                }
            }
            slots.into_iter().flatten().collect()
        }
        None => category
            .label
            .as_ref()
            .map(|labels| labels.keys().cloned().collect())
            .unwrap_or_default(),
    };

    Ok(codes
        .into_iter()
        .map(|code| {
            category
                .label
                .as_ref()
                .and_then(|labels| labels.get(&code))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(code)
        })
        .collect())
}

fn expand_sparse(
    dimensions: &[Dimension],
    cells: &HashMap<String, Option<f64>>,
) -> Result<Vec<Option<f64>>> {
    let total = dimensions
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(d.len()))
        .ok_or_else(|| EtlError::InvalidCube {
            message: "cube shape overflows".to_string(),
        })?;

    let mut values = vec![None; total];
    for (position, value) in cells {
        let index: usize = position.parse().map_err(|_| EtlError::InvalidCube {
            message: format!("sparse value key '{}' is not a position", position),
        })?;
        let slot = values.get_mut(index).ok_or_else(|| EtlError::InvalidCube {
            message: format!("sparse value position {} is outside a cube of {} cells", index, total),
        })?;
        *slot = *value;
    }
    Ok(values)
}
