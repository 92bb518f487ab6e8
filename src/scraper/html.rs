//! 朴素的 HTML 切片工具
//!
//! 不构建 DOM，只按不区分大小写的标签切片；对采集的几类页面足够用。

/// ASCII 小写化，非 ASCII 字符原样保留，字节偏移与原串一致
pub fn to_lower(s: &str) -> String {
    s.chars().map(|c| c.to_ascii_lowercase()).collect()
}

/// 第一个 `open_pat` 开始标签之后、`close_pat` 之前的内容
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = to_lower(s);
    let open = to_lower(open_pat);
    let close = to_lower(close_pat);
    let o = lc.find(&open)?;
    let after = s[o..].find('>')? + o + 1;
    let cr = lc[after..].find(&close)?;
    Some(&s[after..after + cr])
}

/// 从 `from` 起找下一个 `open..close` 块，返回 `(start, end)` 字节范围（含标签）
pub fn next_tag_block_ci(s: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower(s);
    let ol = to_lower(open);
    let cl = to_lower(close);
    let start = lc.get(from..)?.find(&ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&cl)?;
    let end = open_end + end_rel + close.len();
    Some((start, end))
}

/// 所有 `open..close` 块
pub fn tag_blocks_ci<'a>(s: &'a str, open: &str, close: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = next_tag_block_ci(s, open, close, from) {
        blocks.push(&s[start..end]);
        from = end;
    }
    blocks
}

/// 块内第一个开始标签之后、最后一个 `<` 之前的内容
pub fn inner_after_open_tag(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(oe), Some(cs)) if cs > oe => &block[oe + 1..cs],
        _ => "",
    }
}

/// 开始标签（到第一个 `>` 为止）
pub fn open_tag(block: &str) -> &str {
    match block.find('>') {
        Some(end) => &block[..=end],
        None => block,
    }
}

/// 解码常见 HTML 实体
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" | "#160" => Some(' '),
                "ndash" => Some('–'),
                "mdash" => Some('—'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// 空白折叠为单个空格并去掉首尾空白
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉标签、解码实体并折叠空白
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    out.push(' ');
                }
                in_tag = false;
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

/// 按 `<br>`、`<li>`、`<p>` 等块级边界拆成多行文本，丢弃空行
pub fn text_lines(s: &str) -> Vec<String> {
    const BREAKS: [&str; 7] = ["<br", "<li", "</li", "<p", "</p", "<div", "</div"];

    let lc = to_lower(s);
    let mut lines = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;

    while let Some(rel) = lc[i..].find('<') {
        let pos = i + rel;
        if BREAKS.iter().any(|b| {
            lc[pos..].starts_with(b)
                && lc[pos + b.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
        }) {
            lines.push(strip_tags(&s[segment_start..pos]));
            segment_start = pos;
        }
        i = pos + 1;
    }
    lines.push(strip_tags(&s[segment_start..]));

    lines.into_iter().filter(|l| !l.is_empty()).collect()
}

/// 开始标签中的属性值（不区分属性名大小写，支持单双引号）
pub fn attr(tag: &str, name: &str) -> Option<String> {
    let tag = open_tag(tag);
    let lc = to_lower(tag);
    let needle = format!("{}=", to_lower(name));

    let mut from = 0;
    while let Some(rel) = lc[from..].find(&needle) {
        let pos = from + rel;
        let boundary = pos == 0
            || lc[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let value_start = pos + needle.len();
        if boundary {
            let rest = &tag[value_start..];
            let value = match rest.chars().next() {
                Some(q @ ('"' | '\'')) => rest[1..].split(q).next(),
                Some(_) => rest
                    .split(|c: char| c.is_whitespace() || c == '>')
                    .next(),
                None => None,
            };
            return value.map(decode_entities);
        }
        from = value_start;
    }
    None
}

/// 超链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
    pub title: Option<String>,
}

/// 所有带 `href` 的 `<a>` 链接
pub fn links(html: &str) -> Vec<Link> {
    tag_blocks_ci(html, "<a ", "</a>")
        .into_iter()
        .filter_map(|block| {
            let href = attr(block, "href")?;
            Some(Link {
                href,
                text: strip_tags(inner_after_open_tag(block)),
                title: attr(block, "title"),
            })
        })
        .collect()
}

/// 一个标题及其后直到下一个同级或更高级标题之间的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub heading: String,
    pub level: u8,
    pub html: &'a str,
}

/// 按 `<h2>`..`<h4>` 切分正文
pub fn sections(html: &str) -> Vec<Section<'_>> {
    let lc = to_lower(html);
    let mut headings: Vec<(usize, usize, u8, String)> = Vec::new();

    let mut from = 0;
    while let Some(rel) = lc[from..].find("<h") {
        let start = from + rel;
        let level = lc.as_bytes().get(start + 2).copied();
        from = start + 2;

        let level = match level {
            Some(b @ b'2'..=b'4') => b - b'0',
            _ => continue,
        };
        let close = format!("</h{}>", level);
        let Some(end_rel) = lc[start..].find(&close) else {
            continue;
        };
        let end = start + end_rel + close.len();
        let heading = strip_tags(inner_after_open_tag(&html[start..end]))
            .trim_end_matches("[edit]")
            .trim_end_matches("[]")
            .trim()
            .to_string();
        headings.push((start, end, level, heading));
        from = end;
    }

    headings
        .iter()
        .enumerate()
        .map(|(i, (_, end, level, heading))| {
            let stop = headings[i + 1..]
                .iter()
                .find(|(_, _, next_level, _)| next_level <= level)
                .map(|(start, _, _, _)| *start)
                .unwrap_or(html.len());
            Section {
                heading: heading.clone(),
                level: *level,
                html: &html[*end..stop],
            }
        })
        .collect()
}

/// 按标题名（不区分大小写）找段落
pub fn section<'a>(html: &'a str, heading: &str) -> Option<Section<'a>> {
    sections(html)
        .into_iter()
        .find(|s| s.heading.eq_ignore_ascii_case(heading.trim()))
}

/// 信息框中的一个字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoboxField {
    /// `data-source` 属性
    pub source: String,
    pub label: String,
    /// 多值字段按行拆分
    pub values: Vec<String>,
}

impl InfoboxField {
    pub fn text(&self) -> String {
        self.values.join(", ")
    }
}

/// 抽取带 `data-source` 的信息框字段
pub fn infobox(html: &str) -> Vec<InfoboxField> {
    let lc = to_lower(html);
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(rel) = lc[from..].find("data-source=") {
        let pos = from + rel;
        if let Some(tag_start) = lc[..pos].rfind('<') {
            positions.push(tag_start);
        }
        from = pos + "data-source=".len();
    }
    positions.dedup();

    positions
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let stop = positions.get(i + 1).copied().unwrap_or(html.len());
            let block = &html[start..stop];
            let source = attr(block, "data-source")?;

            let label = slice_between_ci(block, "pi-data-label", "</")
                .map(strip_tags)
                .unwrap_or_else(|| source.replace('_', " "));
            let value_html = slice_between_ci(block, "pi-data-value", "</div>")
                .unwrap_or_else(|| inner_after_open_tag(block));
            let values = text_lines(value_html);
            if values.is_empty() {
                return None;
            }
            Some(InfoboxField {
                source,
                label,
                values,
            })
        })
        .collect()
}

/// 表格中的键值行：`<th>键</th><td>值</td>` 或两列 `<td>`
pub fn table_rows(html: &str) -> Vec<(String, String)> {
    tag_blocks_ci(html, "<tr", "</tr>")
        .into_iter()
        .filter_map(|row| {
            let headers = tag_blocks_ci(row, "<th", "</th>");
            let cells = tag_blocks_ci(row, "<td", "</td>");
            let (key, value) = match (headers.first(), cells.as_slice()) {
                (Some(th), [td, ..]) => (*th, *td),
                (None, [k, v, ..]) => (*k, *v),
                _ => return None,
            };
            let key = strip_tags(inner_after_open_tag(key))
                .trim_end_matches(':')
                .trim()
                .to_string();
            let value = text_lines(inner_after_open_tag(value)).join(", ");
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .collect()
}

/// 页面主标题：优先 `<h1>`，否则 `<title>`
pub fn page_title(html: &str) -> Option<String> {
    slice_between_ci(html, "<h1", "</h1>")
        .or_else(|| slice_between_ci(html, "<title", "</title>"))
        .map(strip_tags)
        .filter(|t| !t.is_empty())
}

/// 所有名为 `name` 的开始标签（适用于 `<meta>`、`<img>` 这类无闭合标签）
pub fn open_tags_ci<'a>(s: &'a str, name: &str) -> Vec<&'a str> {
    let lc = to_lower(s);
    let needle = format!("<{}", to_lower(name));
    let mut tags = Vec::new();
    let mut from = 0;
    while let Some(rel) = lc[from..].find(&needle) {
        let start = from + rel;
        let after = start + needle.len();
        let Some(end_rel) = s[after..].find('>') else {
            break;
        };
        let end = after + end_rel + 1;
        if s[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
        {
            tags.push(&s[start..end]);
        }
        from = end;
    }
    tags
}

/// `<meta property="..." content="...">` 的内容
pub fn meta_content(html: &str, property: &str) -> Option<String> {
    open_tags_ci(html, "meta")
        .into_iter()
        .find(|tag| {
            attr(tag, "property")
                .or_else(|| attr(tag, "name"))
                .is_some_and(|p| p.eq_ignore_ascii_case(property))
        })
        .and_then(|tag| attr(tag, "content"))
}

/// 第一个段落的文本
pub fn first_paragraph(html: &str) -> Option<String> {
    tag_blocks_ci(html, "<p", "</p>")
        .into_iter()
        .filter(|p| {
            // 排除 <param> / <path> 之类
            to_lower(p)
                .as_bytes()
                .get(2)
                .is_some_and(|b| *b == b'>' || b.is_ascii_whitespace())
        })
        .map(|p| strip_tags(inner_after_open_tag(p)))
        .find(|t| !t.is_empty())
}
