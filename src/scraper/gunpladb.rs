//! gunpladb.net 页面解析
//!
//! 列表页中的商品链接与商品详情页。

use crate::error::{AppError, Result};
use crate::models::{ArmamentGroup, Grade, MobileSuit};
use crate::scraper::clean;
use crate::scraper::html;

/// 列表页地址，`page` 从 1 开始
pub fn listing_url(base_url: &str, path: &str, page: usize) -> String {
    let base = clean::absolute_url(base_url, path);
    if page <= 1 {
        base
    } else {
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", base, sep, page)
    }
}

/// 列表页中的商品详情链接（绝对地址，去重）
pub fn listing_links(page: &str, page_url: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for link in html::links(page) {
        let path = link.href.split(['?', '#']).next().unwrap_or_default();
        let is_kit = ["/kit/", "/kits/"]
            .iter()
            .any(|p| path.contains(p) && !path.ends_with(p));
        if !is_kit {
            continue;
        }
        let url = clean::absolute_url(page_url, path);
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// 把一行键值写入商品文档；无对应字段时放进规格表
pub(crate) fn apply_product_field(suit: &mut MobileSuit, key: &str, value: &str) {
    let value = clean::strip_footnotes(value);
    if value.is_empty() {
        return;
    }

    match key.trim().to_ascii_lowercase().as_str() {
        "grade" | "line" | "product line" => {
            if let Some(grade) = Grade::parse(&value).or_else(|| clean::grade(&value)) {
                suit.grade = grade;
            }
        }
        "scale" => suit.scale = clean::scale(&value).or(Some(value)),
        "series" | "series / work" | "work" => suit.series = Some(value),
        "model number" | "model no." | "model" | "code" => suit.model_number = Some(value),
        "release date" | "release" | "released" => {
            suit.release_date = clean::release_date(&value).or(Some(value))
        }
        "price" | "msrp" | "retail price" => {
            if let Some(price) = clean::price_yen(&value) {
                suit.price_yen = Some(price);
            }
        }
        "manufacturer" | "brand" | "maker" => suit.manufacturer = Some(value),
        _ => suit.specs.set(key, &value),
    }
}

/// 根据标题补齐等级、比例与型号
pub(crate) fn infer_from_title(suit: &mut MobileSuit, title: &str) {
    if suit.grade == Grade::Other {
        if let Some(grade) = clean::grade(title) {
            suit.grade = grade;
        }
    }
    if suit.scale.is_none() {
        suit.scale = clean::scale(title);
    }
    if suit.model_number.is_none() {
        suit.model_number = clean::model_number(title);
    }
}

/// 列表项段落中的条目
pub(crate) fn list_items(section_html: &str) -> Vec<String> {
    clean::clean_lines(
        html::tag_blocks_ci(section_html, "<li", "</li>")
            .into_iter()
            .map(|li| html::strip_tags(html::inner_after_open_tag(li))),
    )
}

/// 商品详情页
pub fn parse_product(page: &str, url: &str) -> Result<MobileSuit> {
    let title = html::page_title(page)
        .map(|t| clean::strip_footnotes(&t))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Scrape(format!("{} 缺少商品名称", url)))?;

    let mut suit = MobileSuit::new(&title, Grade::Other);
    for (key, value) in html::table_rows(page) {
        apply_product_field(&mut suit, &key, &value);
    }
    infer_from_title(&mut suit, &title);

    let mut armaments = Vec::new();
    for heading in ["Armaments", "Weapons"] {
        if let Some(section) = html::section(page, heading) {
            let items = list_items(section.html);
            if !items.is_empty() {
                armaments.push(ArmamentGroup::new(heading, items));
            }
        }
    }
    if let Some(section) = html::section(page, "Accessories") {
        let items = list_items(section.html);
        if !items.is_empty() {
            armaments.push(ArmamentGroup::new("Accessories", items));
        }
    }

    suit.armaments = armaments;
    suit.description = html::section(page, "Description")
        .and_then(|s| html::first_paragraph(s.html))
        .or_else(|| html::first_paragraph(page))
        .map(|p| clean::strip_footnotes(&p))
        .unwrap_or_default();
    suit.image_url = html::meta_content(page, "og:image");
    suit.source_url = Some(url.to_string());
    Ok(suit)
}
