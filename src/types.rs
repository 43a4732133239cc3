use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDateTime};

/// 一条清洗后的目击记录。
///
/// 所有文本字段均已经过 [`crate::text_normalizer::normalize`] 处理，保证非空、
/// 不含 HTML 字符引用，并已按固定宽度用 `<br>` 换行。
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    pub timestamp: NaiveDateTime,
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub comment: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub shape: String,
}

impl Sighting {
    /// 由时间戳构造记录，年份从时间戳中提取，保证与年份列表使用同一套规则。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: NaiveDateTime,
        latitude: f64,
        longitude: f64,
        comment: String,
        city: String,
        state: String,
        country: String,
        shape: String,
    ) -> Self {
        Self {
            year: timestamp.year(),
            timestamp,
            latitude,
            longitude,
            comment,
            city,
            state,
            country,
            shape,
        }
    }
}

/// 某一年中一个唯一坐标的汇总信息。
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub sightings: usize,
    // 以下字段取自该坐标下第一条记录
    pub comment: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub shape: String,
}

/// 需要清洗的文本列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Comments,
    City,
    State,
    Country,
    Shape,
}

impl TextField {
    pub const ALL: [TextField; 5] = [
        TextField::Comments,
        TextField::City,
        TextField::State,
        TextField::Country,
        TextField::Shape,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            TextField::Comments => "comments",
            TextField::City => "city",
            TextField::State => "state",
            TextField::Country => "country",
            TextField::Shape => "shape",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// 一次加载的行数统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

/// 启动时加载一次、之后只读的目击记录表。
///
/// 只有显式的“重新加载”或“打开文件”操作才会构造新的表并整体替换。
#[derive(Debug, Clone, Default)]
pub struct SightingTable {
    records: Vec<Sighting>,
    years: Vec<i32>,
    source: Option<PathBuf>,
    stats: LoadStats,
}

impl SightingTable {
    pub fn new(records: Vec<Sighting>, source: Option<PathBuf>) -> Self {
        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        let stats = LoadStats {
            total_rows: records.len(),
            kept_rows: records.len(),
            dropped_rows: 0,
        };

        Self {
            records,
            years,
            source,
            stats,
        }
    }

    pub fn with_stats(mut self, stats: LoadStats) -> Self {
        self.stats = stats;
        self
    }

    /// 按文件原始顺序排列的全部记录。
    pub fn records(&self) -> &[Sighting] {
        &self.records
    }

    /// 升序排列、去重后的年份列表。
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 年份选择器的上下界 `(最小年份, 最大年份)`。
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    /// 年份选择器的默认值：所有记录年份的中位数，向零截断。
    ///
    /// 记录数为偶数时取中间两个值的平均数。
    pub fn default_year(&self) -> Option<i32> {
        if self.records.is_empty() {
            return None;
        }

        let mut all_years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        all_years.sort_unstable();

        let mid = all_years.len() / 2;
        let median = if all_years.len() % 2 == 0 {
            (f64::from(all_years[mid - 1]) + f64::from(all_years[mid])) / 2.0
        } else {
            f64::from(all_years[mid])
        };
        Some(median.trunc() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sighting_in(year: i32) -> Sighting {
        let ts = NaiveDate::from_ymd_opt(year, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        Sighting::new(
            ts,
            1.0,
            2.0,
            "c".into(),
            "city".into(),
            "st".into(),
            "us".into(),
            "disk".into(),
        )
    }

    #[test]
    fn test_year_list_and_bounds() {
        let table = SightingTable::new(
            vec![sighting_in(2001), sighting_in(1999), sighting_in(2001)],
            None,
        );
        assert_eq!(table.years(), &[1999, 2001]);
        assert_eq!(table.year_bounds(), Some((1999, 2001)));
    }

    #[test]
    fn test_default_year_is_truncated_median() {
        let odd = SightingTable::new(
            vec![sighting_in(1990), sighting_in(2010), sighting_in(2000)],
            None,
        );
        assert_eq!(odd.default_year(), Some(2000));

        let even = SightingTable::new(vec![sighting_in(2000), sighting_in(2003)], None);
        assert_eq!(even.default_year(), Some(2001));
    }

    #[test]
    fn test_empty_table() {
        let table = SightingTable::default();
        assert!(table.is_empty());
        assert_eq!(table.year_bounds(), None);
        assert_eq!(table.default_year(), None);
    }
}
