use std::collections::HashMap;

use crate::types::{AggregatedLocation, Sighting, SightingTable};

/// 坐标分组键：直接使用 `f64` 的位模式，保证“完全相同”的坐标才会归为一组。
/// `-0.0` 先折算成 `0.0`，与数值相等的语义保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordinateKey(u64, u64);

impl CoordinateKey {
    fn new(latitude: f64, longitude: f64) -> Self {
        Self(canonical_bits(latitude), canonical_bits(longitude))
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// 按年份筛选记录，并按精确坐标分组汇总。
///
/// 每个分组的 `sightings` 为该坐标的记录数，展示字段取自该组在输入顺序中的第一条记录。
/// 结果中每个不同坐标恰好出现一次，顺序为各坐标首次出现的顺序。
/// 没有匹配记录时返回空列表。
pub fn aggregate(records: &[Sighting], year: i32) -> Vec<AggregatedLocation> {
    let mut index_by_key: HashMap<CoordinateKey, usize> = HashMap::new();
    let mut locations: Vec<AggregatedLocation> = Vec::new();

    for record in records.iter().filter(|r| r.year == year) {
        let key = CoordinateKey::new(record.latitude, record.longitude);
        match index_by_key.get(&key) {
            Some(&idx) => locations[idx].sightings += 1,
            None => {
                index_by_key.insert(key, locations.len());
                locations.push(AggregatedLocation {
                    latitude: record.latitude,
                    longitude: record.longitude,
                    sightings: 1,
                    comment: record.comment.clone(),
                    city: record.city.clone(),
                    state: record.state.clone(),
                    country: record.country.clone(),
                    shape: record.shape.clone(),
                });
            }
        }
    }

    log::debug!(
        "[Aggregator] {} 年共 {} 个不同坐标。",
        year,
        locations.len()
    );
    locations
}

/// 所有坐标的目击次数之和，即该年的记录总数。
pub fn total_sightings(locations: &[AggregatedLocation]) -> usize {
    locations.iter().map(|l| l.sightings).sum()
}

/// 选中年份的汇总结果，每次切换年份时整体重新计算。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    pub total: usize,
    pub max_sightings: usize,
    pub locations: Vec<AggregatedLocation>,
}

impl YearSummary {
    pub fn compute(table: &SightingTable, year: i32) -> Self {
        let locations = aggregate(table.records(), year);
        Self {
            year,
            total: total_sightings(&locations),
            max_sightings: locations.iter().map(|l| l.sightings).max().unwrap_or(0),
            locations,
        }
    }
}
