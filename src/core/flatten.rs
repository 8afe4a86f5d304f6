//! 將統計立方體攤平成每個儲存格一筆記錄
//!
//! 數值陣列依傳入的維度順序為 row-major：最後一個維度變化最快。
//! 順序是否符合資料來源由呼叫端負責；JSON-stat 解碼器使用資料集的 `id`。

use crate::domain::model::{Cube, Dimension, Record};
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

/// 每筆記錄中存放儲存格數值的保留欄位名稱
pub const VALUE_FIELD: &str = "value";

/// 將 `dimensions` x `values` 攤平成記錄，順序與 `values` 相同
///
/// 所有檢查都在產生記錄之前完成，錯誤時不會有部分輸出
pub fn flatten(dimensions: &[Dimension], values: &[Option<f64>]) -> Result<Vec<Record>> {
    validate_shape(dimensions, values.len())?;

    // 逐一維度擴展部分鍵；最後處理的維度變化最快
    let keys = dimensions
        .iter()
        .fold(vec![Vec::with_capacity(dimensions.len())], |partial: Vec<Vec<usize>>, dimension| {
            let mut extended = Vec::with_capacity(partial.len() * dimension.len());
            for key in &partial {
                for category in 0..dimension.len() {
                    let mut next = key.clone();
                    next.push(category);
                    extended.push(next);
                }
            }
            extended
        });

    let records = keys
        .into_iter()
        .zip(values.iter().copied())
        .map(|(key, value)| Record {
            labels: dimensions
                .iter()
                .zip(key)
                .map(|(dimension, category)| {
                    (dimension.name.clone(), dimension.categories[category].clone())
                })
                .collect(),
            value,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Flattened cube of {} dimension(s) into {} records",
        dimensions.len(),
        records.len()
    );

    Ok(records)
}

/// 對已解碼的立方體呼叫 [`flatten`]
pub fn flatten_cube(cube: &Cube) -> Result<Vec<Record>> {
    flatten(&cube.dimensions, &cube.values)
}

fn validate_shape(dimensions: &[Dimension], value_count: usize) -> Result<()> {
    if dimensions.is_empty() {
        return Err(EtlError::InvalidCube {
            message: "cube has no dimensions".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for dimension in dimensions {
        if dimension.is_empty() {
            return Err(EtlError::InvalidCube {
                message: format!("dimension '{}' has no categories", dimension.name),
            });
        }
        if dimension.name == VALUE_FIELD {
            return Err(EtlError::InvalidCube {
                message: format!("dimension name '{}' is reserved", VALUE_FIELD),
            });
        }
        if !seen.insert(dimension.name.as_str()) {
            return Err(EtlError::InvalidCube {
                message: format!("dimension '{}' appears more than once", dimension.name),
            });
        }
    }

    let shape: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, len| acc.checked_mul(*len))
        .ok_or_else(|| EtlError::InvalidCube {
            message: format!("cube shape {:?} overflows", shape),
        })?;

    if expected != value_count {
        return Err(EtlError::CubeShapeMismatch {
            shape,
            expected,
            actual: value_count,
        });
    }

    Ok(())
}
