use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};

/// 文本为空 (缺失) 时返回的固定占位文本。
pub const MISSING_TEXT_SENTINEL: &str = "No description available.";

/// 换行后各行之间使用的分隔标记，供支持 HTML 的渲染端使用。
pub const LINE_BREAK_MARKER: &str = "<br>";

/// 匹配一个 HTML 字符引用：十进制或十六进制数字引用，或一个可能的实体名。
/// 结尾的 `;` 可以省略，是否能解码由替换函数决定。
static HTML_ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]+);?|#[xX]([0-9a-fA-F]+);?|([^\t\n\x0C <&#;]{1,32});?)")
        .expect("未能编译 HTML_ENTITY_REGEX")
});

/// 允许省略结尾 `;` 的旧式命名实体 (HTML5 规范中的 legacy 实体)。
const LEGACY_ENTITY_NAMES: [&str; 106] = [
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// 0x80..=0x9F 的数字引用按 Windows-1252 解释，未定义的位置保留原码点。
const CP1252_REMAP: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

/// 匹配残留的十进制数字引用 `&#<digits>`，不要求结尾的 `;`。
static NUMERIC_ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(\d+)").expect("未能编译 NUMERIC_ENTITY_REGEX"));

/// 换行时视为单词分隔符的字符。不换行空格等 Unicode 空白属于单词的一部分。
const WRAP_SEPARATORS: [char; 6] = [' ', '\t', '\n', '\x0B', '\x0C', '\r'];

/// 清理一段自由文本并按固定宽度换行。
///
/// 处理步骤：
/// 1. `text` 缺失时直接返回 [`MISSING_TEXT_SENTINEL`]。
/// 2. 连续解码两次 HTML 实体，用于处理被重复编码的输入 (如 `&amp;#39;`)。
/// 3. 把残留的 `&#<digits>` (可能缺少 `;`) 替换为对应码点的字符；
///    码点非法时保留原样。
/// 4. 按单词边界贪婪换行，各行用 `<br>` 连接。
///
/// # Arguments
/// * `text` - 原始文本，`None` 表示缺失。
/// * `width` - 每行的最大字符数。
pub fn normalize(text: Option<&str>, width: usize) -> String {
    let Some(text) = text else {
        return MISSING_TEXT_SENTINEL.to_string();
    };

    let once = decode_html_entities(text);
    let twice = decode_html_entities(&once);
    let fixed = fix_numeric_entities(&twice);

    wrap_text(&fixed, width).join(LINE_BREAK_MARKER)
}

/// 解码一轮 HTML 字符引用。
///
/// 命名实体查 HTML5 实体表，旧式实体可以省略 `;`，并且可以直接接在其他字母前
/// (如 `&ampx` 解码为 `&x`)。数字引用的 `;` 可省略；0x80..=0x9F 按 Windows-1252
/// 映射，`&#0;` 变为 U+FFFD，`&#13;` 变为 `\r`。码点非法或无法识别的引用原样保留。
pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    HTML_ENTITY_REGEX.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let decoded = if let Some(dec) = caps.get(1) {
            dec.as_str().parse::<u32>().ok().and_then(decode_code_point)
        } else if let Some(hex) = caps.get(2) {
            u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(decode_code_point)
        } else if caps.get(3).is_some() {
            // 捕获组不含 `&`，但 `;` 需要参与旧式实体的判断
            decode_named_entity(&whole[1..])
        } else {
            None
        };
        decoded.unwrap_or_else(|| whole.to_string())
    })
}

fn decode_code_point(code: u32) -> Option<String> {
    let ch = match code {
        0 => '\u{FFFD}',
        0x0D => '\r',
        0x80..=0x9F => CP1252_REMAP[(code - 0x80) as usize],
        _ => char::from_u32(code)?,
    };
    Some(ch.to_string())
}

fn is_legacy_entity(name: &str) -> bool {
    LEGACY_ENTITY_NAMES.contains(&name)
}

/// `reference` 为 `&` 之后的部分，可能带有结尾的 `;`。
fn decode_named_entity(reference: &str) -> Option<String> {
    match reference.strip_suffix(';') {
        Some(name) => {
            if let Some(value) = resolve_html5_entity(name) {
                return Some(value.to_string());
            }
        }
        None => {
            if is_legacy_entity(reference) {
                return resolve_html5_entity(reference).map(str::to_string);
            }
        }
    }

    // 最长前缀匹配旧式实体，剩余部分原样跟在后面
    (2..reference.len())
        .rev()
        .filter(|&end| reference.is_char_boundary(end))
        .find(|&end| is_legacy_entity(&reference[..end]))
        .and_then(|end| {
            resolve_html5_entity(&reference[..end])
                .map(|value| format!("{value}{}", &reference[end..]))
        })
}

/// 把残留的 `&#<digits>` 数字引用替换为对应字符。
///
/// 与 [`decode_html_entities`] 不同，这里不要求结尾的 `;`，
/// `;` 如果存在也会保留在结果中。数值溢出或不是合法的 Unicode 标量值时，
/// 只保留该处引用，不影响其余文本。控制字符照常插入。
pub fn fix_numeric_entities(text: &str) -> Cow<'_, str> {
    NUMERIC_ENTITY_REGEX.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        caps.get(1)
            .and_then(|digits| digits.as_str().parse::<u32>().ok())
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| whole.to_string())
    })
}

/// 按单词边界贪婪换行。
///
/// 只有 ASCII 空白 (空格、制表符、换行等) 视为单词分隔符，行首行尾的空白被丢弃。
/// 超过 `width` 的单词不会被拆开，而是单独占一行。
/// 空字符串或纯空白字符串返回空列表。
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text
        .split(WRAP_SEPARATORS)
        .filter(|word| !word.is_empty())
    {
        let word_len = word.chars().count();

        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
