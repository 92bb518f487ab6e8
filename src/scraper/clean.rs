//! 采集文本清洗
//!
//! 名称清洗、列表拆分、型号 / 比例 / 价格识别与 wiki 标题转换。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Grade;

static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:\d+|[a-z]|note \d+|citation needed)\]").expect("valid footnote regex"));
static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[(（][^()（）]*[)）]").expect("valid parenthetical regex"));
static MODEL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{1,5}(?:-[A-Z]{1,3})?-[A-Z]?\d{1,4}[A-Z0-9]*(?:[-/][A-Z0-9]+)*)\b")
        .expect("valid model number regex")
});
static SCALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b1\s*/\s*(\d{2,4})\b").expect("valid scale regex"));
static GRADE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(HGUC|HGCE|HGAC|HGBF|HGIBO|HG|RG|MGEX|MG|PGU|PG|SDEX|SDCS|SD|EG|RE/100|FM|Full Mechanics|Master Grade|Real Grade|High Grade|Perfect Grade|Entry Grade)\b")
        .expect("valid grade regex")
});
static YEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:¥|￥|JPY\s*)\s*([\d,]+)|([\d,]+)\s*(?:yen|円)")
        .expect("valid yen regex")
});

/// 名称清洗：去掉脚注、括号限定语与多余空白
pub fn clean_name(s: &str) -> String {
    let without_notes = FOOTNOTE.replace_all(s, "");
    let without_parens = PARENTHETICAL.replace_all(&without_notes, "");
    normalize(&without_parens)
}

/// 只去掉脚注标记，保留括号
pub fn strip_footnotes(s: &str) -> String {
    normalize(&FOOTNOTE.replace_all(s, ""))
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c == ':' || c.is_whitespace())
        .to_string()
}

/// 拆分以逗号、分号或换行分隔的列表，清洗并去重
pub fn split_list(s: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for part in s.split([',', ';', '\n', '•']) {
        let item = clean_name(part);
        if item.is_empty() || items.iter().any(|i| i.eq_ignore_ascii_case(&item)) {
            continue;
        }
        items.push(item);
    }
    items
}

/// 清洗多行值，去重
pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items: Vec<String> = Vec::new();
    for line in lines {
        for item in split_list(line.as_ref()) {
            if !items.iter().any(|i| i.eq_ignore_ascii_case(&item)) {
                items.push(item);
            }
        }
    }
    items
}

/// 识别型号，例如 `RX-78-2`、`MS-06S`、`ASW-G-08`
pub fn model_number(s: &str) -> Option<String> {
    MODEL_NUMBER.captures(s).map(|c| c[1].to_string())
}

/// 识别比例，统一为 `1/144` 形式
pub fn scale(s: &str) -> Option<String> {
    SCALE.captures(s).map(|c| format!("1/{}", &c[1]))
}

/// 从标题或标签中识别模型等级
pub fn grade(s: &str) -> Option<Grade> {
    GRADE_TOKEN
        .captures_iter(s)
        .find_map(|c| Grade::parse(&c[1]))
}

/// 解析日元价格，例如 `¥1,320`、`4,950 yen`
pub fn price_yen(s: &str) -> Option<u32> {
    let caps = YEN.captures(s)?;
    let digits: String = caps
        .get(1)
        .or_else(|| caps.get(2))?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|p| *p > 0)
}

/// wiki 标题转路径段：空格变下划线并做 URL 编码
pub fn title_to_path(title: &str) -> String {
    let underscored = title.trim().replace(' ', "_");
    urlencoding::encode(&underscored)
        .replace("%2F", "/")
        .replace("%3A", ":")
}

/// wiki URL 转标题
pub fn url_to_title(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.split("/wiki/").nth(1)?;
    let decoded = urlencoding::decode(segment).ok()?;
    let title = decoded.replace('_', " ");
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// 相对链接补全为绝对地址
pub fn absolute_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    let base = base.trim_end_matches('/');
    if href.starts_with('/') {
        // 取 scheme://host 部分
        let origin_end = base
            .find("://")
            .and_then(|i| base[i + 3..].find('/').map(|j| i + 3 + j))
            .unwrap_or(base.len());
        format!("{}{}", &base[..origin_end], href)
    } else {
        format!("{}/{}", base, href)
    }
}

/// 日期规范化：只保留 `YYYY-MM-DD`、`YYYY-MM` 或 `YYYY` 形式
pub fn release_date(s: &str) -> Option<String> {
    static DATE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\b(\d{4})(?:[-/.](\d{1,2})(?:[-/.](\d{1,2}))?)?\b").expect("valid date regex")
    });

    let caps = DATE.captures(s)?;
    let year = &caps[1];
    Some(match (caps.get(2), caps.get(3)) {
        (Some(m), Some(d)) => format!("{}-{:0>2}-{:0>2}", year, m.as_str(), d.as_str()),
        (Some(m), None) => format!("{}-{:0>2}", year, m.as_str()),
        _ => year.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Char Aznable[1]", "Char Aznable")]
    #[case("Zaku II (Char Custom)[citation needed]", "Zaku II")]
    #[case("  Ramba   Ral ,", "Ramba Ral")]
    #[case("Principality of Zeon（ジオン公国）", "Principality of Zeon")]
    fn test_clean_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_name(input), expected);
    }

    #[test]
    fn test_split_list_dedups() {
        assert_eq!(
            split_list("Earth Federation[2]; Londo Bell, earth federation\nKaraba"),
            vec!["Earth Federation", "Londo Bell", "Karaba"]
        );
        assert_eq!(clean_lines(["Amuro Ray", "Kai Shiden, Amuro Ray"]), vec!["Amuro Ray", "Kai Shiden"]);
    }

    #[rstest]
    #[case("RX-78-2 Gundam", Some("RX-78-2"))]
    #[case("MS-06S Zaku II Commander Type", Some("MS-06S"))]
    #[case("GAT-X105 Strike", Some("GAT-X105"))]
    #[case("ASW-G-08 Gundam Barbatos", Some("ASW-G-08"))]
    #[case("Gundam Aerial", None)]
    fn test_model_number(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(model_number(input).as_deref(), expected);
    }

    #[test]
    fn test_scale_and_grade() {
        assert_eq!(scale("MG 1/100 Zaku II").as_deref(), Some("1/100"));
        assert_eq!(scale("1 / 144"), Some("1/144".to_string()));
        assert_eq!(scale("no scale"), None);
        assert_eq!(grade("HGUC 1/144 RX-78-2"), Some(Grade::HighGrade));
        assert_eq!(grade("Master Grade Ver.Ka"), Some(Grade::MasterGrade));
        assert_eq!(grade("RE/100 Jagd Doga"), Some(Grade::Reborn100));
        assert_eq!(grade("Mega Size Model"), None);
    }

    #[rstest]
    #[case("¥1,320", Some(1320))]
    #[case("Price: 4,950 yen (tax incl.)", Some(4950))]
    #[case("JPY 16500", Some(16500))]
    #[case("2,200円", Some(2200))]
    #[case("$45.99", None)]
    fn test_price_yen(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(price_yen(input), expected);
    }

    #[test]
    fn test_wiki_title_conversion() {
        assert_eq!(title_to_path("Char's Counterattack"), "Char%27s_Counterattack");
        assert_eq!(
            url_to_title("https://gundam.fandom.com/wiki/RX-78-2_Gundam?so=search").as_deref(),
            Some("RX-78-2 Gundam")
        );
        assert_eq!(url_to_title("https://gundam.fandom.com/"), None);
    }

    #[test]
    fn test_absolute_url() {
        let base = "https://gundam.fandom.com/wiki/Category:Factions";
        assert_eq!(absolute_url(base, "/wiki/Zeon"), "https://gundam.fandom.com/wiki/Zeon");
        assert_eq!(absolute_url(base, "//img.example/a.png"), "https://img.example/a.png");
        assert_eq!(absolute_url("https://x.net/kits", "hg-1"), "https://x.net/kits/hg-1");
        assert_eq!(absolute_url(base, "https://other/x"), "https://other/x");
    }

    #[test]
    fn test_release_date() {
        assert_eq!(release_date("Released 2023/7/15").as_deref(), Some("2023-07-15"));
        assert_eq!(release_date("2021-03").as_deref(), Some("2021-03"));
        assert_eq!(release_date("Spring 1999").as_deref(), Some("1999"));
        assert_eq!(release_date("TBA"), None);
    }
}
