//! 参考特征向量

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// 特征向量（人脸描述子等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// 欧氏距离，维度不一致时返回 None
    pub fn euclidean_distance(&self, other: &FeatureVector) -> Option<f32> {
        if self.dimension() != other.dimension() {
            return None;
        }
        let sum: f32 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// 参考向量集合
///
/// 运行前提供，运行期间不可变。所有向量维度一致。
/// 空集合是合法的：指定人物模式下它不会匹配任何图片。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    vectors: Vec<FeatureVector>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从向量列表创建，逐个校验维度
    pub fn from_vectors(
        vectors: impl IntoIterator<Item = FeatureVector>,
    ) -> Result<Self, ReferenceError> {
        let mut set = Self::new();
        for vector in vectors {
            set.push(vector)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, vector: FeatureVector) -> Result<(), ReferenceError> {
        if vector.dimension() == 0 {
            return Err(ReferenceError::EmptyVector);
        }
        if let Some(expected) = self.dimension() {
            if expected != vector.dimension() {
                return Err(ReferenceError::DimensionMismatch {
                    expected,
                    found: vector.dimension(),
                });
            }
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// 向量维度，空集合没有维度
    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(FeatureVector::dimension)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.vectors.iter()
    }

    /// 给定向量到集合中所有向量的最小距离
    ///
    /// 空集合或维度全部不一致时返回 None，调用方不能对空集合求最小值。
    pub fn min_distance(&self, probe: &FeatureVector) -> Option<f32> {
        self.vectors
            .iter()
            .filter_map(|reference| reference.euclidean_distance(probe))
            .fold(None, |best: Option<f32>, dist| match best {
                Some(b) if b <= dist => Some(b),
                _ => Some(dist),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = FeatureVector::new(vec![0.0, 0.0]);
        let b = FeatureVector::new(vec![3.0, 4.0]);
        assert_eq!(a.euclidean_distance(&b), Some(5.0));
        assert_eq!(a.euclidean_distance(&FeatureVector::new(vec![1.0])), None);
    }

    #[test]
    fn test_push_rejects_mismatched_dimension() {
        let mut set = ReferenceSet::new();
        set.push(FeatureVector::new(vec![0.1, 0.2])).unwrap();
        assert_eq!(
            set.push(FeatureVector::new(vec![0.1])),
            Err(ReferenceError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(set.push(FeatureVector::new(vec![])), Err(ReferenceError::EmptyVector));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_min_distance_over_empty_set() {
        let set = ReferenceSet::new();
        assert_eq!(set.min_distance(&FeatureVector::new(vec![1.0, 2.0])), None);
    }

    #[test]
    fn test_min_distance_picks_closest() {
        let set = ReferenceSet::from_vectors(vec![
            FeatureVector::new(vec![1.0, 0.0]),
            FeatureVector::new(vec![0.0, 0.5]),
        ])
        .unwrap();
        assert_eq!(set.min_distance(&FeatureVector::new(vec![0.0, 0.0])), Some(0.5));
    }
}
