use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;

use crate::app_settings::{DEFAULT_MISSING_PLACEHOLDER, DEFAULT_WRAP_WIDTH, DataSettings};
use crate::error::{AppError, AppResult};
use crate::text_normalizer::normalize;
use crate::types::{LoadStats, Sighting, SightingTable, TextField};

/// 必须存在的列 (已去除首尾空白并转为小写)。
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "datetime",
    "latitude",
    "longitude",
    "comments",
    "city",
    "state",
    "country",
    "shape",
];

const DATETIME_FORMATS: [&str; 5] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// 加载选项，一般由 [`DataSettings`] 转换而来。
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub wrap_width: usize,
    pub missing_placeholder: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            missing_placeholder: DEFAULT_MISSING_PLACEHOLDER.to_string(),
        }
    }
}

impl From<&DataSettings> for LoadOptions {
    fn from(settings: &DataSettings) -> Self {
        Self {
            wrap_width: settings.wrap_width.max(1),
            missing_placeholder: settings.missing_placeholder.clone(),
        }
    }
}

/// CSV 中的一行原始数据。所有列都按字符串读取，解析失败由调用方决定如何处理。
#[derive(Debug, Deserialize)]
struct RawRow {
    datetime: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    comments: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    shape: Option<String>,
}

impl RawRow {
    fn text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Comments => self.comments.as_deref(),
            TextField::City => self.city.as_deref(),
            TextField::State => self.state.as_deref(),
            TextField::Country => self.country.as_deref(),
            TextField::Shape => self.shape.as_deref(),
        }
    }
}

/// 解析日期时间字符串，依次尝试几种常见格式。无法解析时返回 `None`。
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// 解析坐标。非数字以及 `NaN`/`inf` 都视为无法解析。
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 清洗一个文本列：空值先替换为占位文本，再做实体解码与换行。
pub fn clean_text_field(raw: Option<&str>, options: &LoadOptions) -> String {
    let filled = match raw {
        Some(value) if !value.trim().is_empty() => value,
        _ => options.missing_placeholder.as_str(),
    };
    let cleaned = normalize(Some(filled), options.wrap_width);
    if cleaned.is_empty() {
        options.missing_placeholder.clone()
    } else {
        cleaned
    }
}

fn normalized_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<StringRecord>()
}

fn build_sighting(row: &RawRow, options: &LoadOptions) -> Option<Sighting> {
    let timestamp = parse_timestamp(row.datetime.as_deref()?)?;
    let latitude = parse_coordinate(row.latitude.as_deref()?)?;
    let longitude = parse_coordinate(row.longitude.as_deref()?)?;

    let [comment, city, state, country, shape] =
        TextField::ALL.map(|field| clean_text_field(row.text(field), options));

    Some(Sighting::new(
        timestamp, latitude, longitude, comment, city, state, country, shape,
    ))
}

/// 从任意 reader 读取目击记录。
///
/// 表头去除首尾空白后按小写匹配；缺少必需列时返回 [`AppError::MissingColumn`]。
/// 时间或坐标无法解析的行、以及 CSV 层面无法解码的行会被静默丢弃。
pub fn load_sightings_from_reader<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> AppResult<(Vec<Sighting>, LoadStats)> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = normalized_headers(csv_reader.headers()?);
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(AppError::EmptyHeader);
    }
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(AppError::MissingColumn(column.to_string()));
        }
    }
    csv_reader.set_headers(headers);

    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for result in csv_reader.deserialize::<RawRow>() {
        stats.total_rows += 1;
        match result {
            Ok(row) => match build_sighting(&row, options) {
                Some(sighting) => records.push(sighting),
                None => stats.dropped_rows += 1,
            },
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(e.into());
                }
                log::trace!("[Loader] 跳过无法解码的行: {e}");
                stats.dropped_rows += 1;
            }
        }
    }
    stats.kept_rows = records.len();

    if stats.dropped_rows > 0 {
        log::debug!("[Loader] 丢弃了 {} 行无效数据。", stats.dropped_rows);
    }
    Ok((records, stats))
}

/// 从文件加载目击记录并构建只读的记录表。
pub fn load_sightings(path: &Path, options: &LoadOptions) -> AppResult<SightingTable> {
    log::info!("[Loader] 开始加载数据文件: {}", path.display());
    let file = File::open(path)?;
    let (records, stats) = load_sightings_from_reader(file, options)?;

    let table = SightingTable::new(records, Some(path.to_path_buf())).with_stats(stats);
    log::info!(
        "[Loader] 数据加载完成: 共 {} 行，保留 {} 行，丢弃 {} 行，涉及 {} 个年份。",
        stats.total_rows,
        stats.kept_rows,
        stats.dropped_rows,
        table.years().len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;

    const HEADER: &str = "datetime,city,state,country,shape,duration (seconds),duration (hours/min),comments,date posted,latitude,longitude \n";

    fn load_str(content: &str) -> AppResult<(Vec<Sighting>, LoadStats)> {
        load_sightings_from_reader(content.as_bytes(), &LoadOptions::default())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let dt = parse_timestamp("10/10/1949 20:30").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.hour()), (1949, 10, 20));
        assert_eq!(parse_timestamp(" 2004-05-01 13:45:00 ").unwrap().year(), 2004);
        assert_eq!(parse_timestamp("2004-05-01T13:45:00").unwrap().year(), 2004);
        assert_eq!(parse_timestamp("7/4/1976").unwrap().year(), 1976);
        assert!(parse_timestamp("10/11/1968 24:00").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate(" 29.8830556 "), Some(29.8830556));
        assert_eq!(parse_coordinate("-97.9411111"), Some(-97.9411111));
        assert_eq!(parse_coordinate("33q.200088"), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(parse_coordinate("inf"), None);
        assert_eq!(parse_coordinate(""), None);
    }

    #[test]
    fn test_clean_text_field_fills_missing() {
        let options = LoadOptions::default();
        assert_eq!(clean_text_field(None, &options), "Unknown");
        assert_eq!(clean_text_field(Some("   "), &options), "Unknown");
        assert_eq!(clean_text_field(Some("&#32;"), &options), "Unknown");
        assert_eq!(clean_text_field(Some("san marcos"), &options), "san marcos");
    }

    #[test]
    fn test_load_rows_and_drop_invalid() {
        let content = format!(
            "{HEADER}\
10/10/1949 20:30,san marcos,tx,us,cylinder,2700,45 minutes,This event took place in early fall around 1949-50&#44 ok,4/27/2004,29.8830556,-97.9411111\n\
10/11/1968 24:00,hudson,ma,,light,60,1 min,bad time,2/24/2007,42.3916667,-71.5666667\n\
10/10/1956 21:00,edna,tx,us,circle,20,1/2 hour,My father &amp;amp; I,1/17/2004,28.9783333,abc\n\
10/10/1960 20:00,kaneohe,hi,,light,900,15 minutes,,1/22/2004,21.4180556,-157.8036111\n"
        );
        let (records, stats) = load_str(&content).unwrap();
        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.kept_rows, 2);
        assert_eq!(stats.dropped_rows, 2);

        assert_eq!(records[0].year, 1949);
        assert_eq!(records[0].city, "san marcos");
        assert_eq!(
            records[0].comment,
            "This event took place in early fall around 1949-50, ok"
        );

        assert_eq!(records[1].year, 1960);
        assert_eq!(records[1].country, "Unknown");
        assert_eq!(records[1].comment, "Unknown");
    }

    #[test]
    fn test_header_is_trimmed_and_case_insensitive() {
        let content = " DateTime ,City,STATE,Country,Shape,Comments, Latitude,LONGITUDE \n\
1/1/2000 10:00,a,b,c,disk,hello,1.5,2.5\n";
        let (records, _) = load_str(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, 1.5);
        assert_eq!(records[0].longitude, 2.5);
        assert_eq!(records[0].shape, "disk");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let content = "datetime,city,state,country,shape,comments,latitude\n";
        match load_str(content) {
            Err(AppError::MissingColumn(column)) => assert_eq!(column, "longitude"),
            other => panic!("预期 MissingColumn 错误，实际为 {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_dropped() {
        let content = "datetime,city,state,country,shape,comments,latitude,longitude\n\
1/1/2000 10:00,a,b\n\
1/1/2001 10:00,a,b,c,disk,hello,1.0,2.0\n";
        let (records, stats) = load_str(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.dropped_rows, 1);
    }

    #[test]
    fn test_comment_is_wrapped() {
        let content = "datetime,city,state,country,shape,comments,latitude,longitude\n\
1/1/2000 10:00,a,b,c,disk,one two three,1.0,2.0\n";
        let options = LoadOptions {
            wrap_width: 7,
            ..LoadOptions::default()
        };
        let (records, _) = load_sightings_from_reader(content.as_bytes(), &options).unwrap();
        assert_eq!(records[0].comment, "one two<br>three");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "datetime,city,state,country,shape,comments,latitude,longitude\n\
1/1/2000 10:00,a,b,c,disk,x,1.0,2.0\n\
1/1/2002 10:00,a,b,c,disk,y,1.0,2.0\n"
        )
        .unwrap();

        let table = load_sightings(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.years(), &[2000, 2002]);
        assert_eq!(table.source().map(|p| p.as_path()), Some(file.path()));
        assert_eq!(table.stats().kept_rows, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_sightings(&dir.path().join("nope.csv"), &LoadOptions::default());
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
