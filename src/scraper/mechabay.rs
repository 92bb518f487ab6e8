//! mechabay.com 页面解析
//!
//! 商店式列表页（`/products/` 链接）与商品详情页。

use crate::error::{AppError, Result};
use crate::models::{ArmamentGroup, Grade, MobileSuit};
use crate::scraper::clean;
use crate::scraper::gunpladb::{apply_product_field, infer_from_title, list_items};
use crate::scraper::html;

/// 列表页地址，`page` 从 1 开始
pub fn listing_url(base_url: &str, collection: &str, page: usize) -> String {
    let collection = collection.trim().trim_matches('/');
    let path = if collection.starts_with("collections/") {
        format!("/{}", collection)
    } else {
        format!("/collections/{}", collection)
    };
    let base = clean::absolute_url(base_url, &path);
    if page <= 1 {
        base
    } else {
        format!("{}?page={}", base, page)
    }
}

/// 列表页中的商品链接（绝对地址，去重）
pub fn listing_links(page: &str, page_url: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for link in html::links(page) {
        let path = link.href.split(['?', '#']).next().unwrap_or_default();
        // 集合内商品链接形如 /collections/x/products/y，统一为 /products/y
        let Some(idx) = path.find("/products/") else {
            continue;
        };
        let handle = &path[idx..];
        if handle.len() <= "/products/".len() {
            continue;
        }
        let url = clean::absolute_url(page_url, handle);
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// 商品详情页
pub fn parse_product(page: &str, url: &str) -> Result<MobileSuit> {
    let title = html::meta_content(page, "og:title")
        .or_else(|| html::page_title(page))
        .map(|t| clean::strip_footnotes(&t))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Scrape(format!("{} 缺少商品名称", url)))?;
    let name = strip_store_suffix(&title);

    let mut suit = MobileSuit::new(&name, Grade::Other);
    suit.manufacturer = html::meta_content(page, "product:brand")
        .or_else(|| vendor(page))
        .filter(|v| !v.is_empty());

    for (key, value) in html::table_rows(page) {
        apply_product_field(&mut suit, &key, &value);
    }
    // 描述区常见 "Scale: 1/100" 这样的行
    let body = description_html(page);
    for line in html::text_lines(body) {
        if let Some((key, value)) = line.split_once(':') {
            if key.len() <= 24 {
                apply_product_field(&mut suit, key, value);
            }
        }
    }
    if suit.price_yen.is_none() {
        suit.price_yen = html::meta_content(page, "product:price:amount")
            .filter(|_| {
                html::meta_content(page, "product:price:currency")
                    .is_some_and(|c| c.eq_ignore_ascii_case("JPY"))
            })
            .and_then(|amount| amount.split('.').next().map(|d| d.replace(',', "")))
            .and_then(|digits| digits.parse().ok());
    }
    infer_from_title(&mut suit, &name);

    let accessories = html::section(body, "Accessories")
        .or_else(|| html::section(body, "Included"))
        .map(|s| list_items(s.html))
        .unwrap_or_default();
    if !accessories.is_empty() {
        suit.armaments = vec![ArmamentGroup::new("Accessories", accessories)];
    }

    suit.description = html::first_paragraph(body)
        .map(|p| clean::strip_footnotes(&p))
        .filter(|p| !p.contains(':') || p.len() > 80)
        .unwrap_or_default();
    suit.image_url = html::meta_content(page, "og:image").map(|src| clean::absolute_url(url, &src));
    suit.source_url = Some(url.to_string());
    Ok(suit)
}

/// 去掉标题末尾的店铺名，例如 `... – Mecha Bay`
fn strip_store_suffix(title: &str) -> String {
    title
        .rsplit_once(" – ")
        .or_else(|| title.rsplit_once(" | "))
        .filter(|(_, store)| store.to_ascii_lowercase().contains("mecha"))
        .map(|(name, _)| name.trim().to_string())
        .unwrap_or_else(|| title.trim().to_string())
}

fn vendor(page: &str) -> Option<String> {
    html::slice_between_ci(page, "product__vendor", "</").map(html::strip_tags)
}

fn description_html(page: &str) -> &str {
    html::slice_between_ci(page, "product__description", "</section>")
        .or_else(|| html::slice_between_ci(page, "product-single__description", "</section>"))
        .unwrap_or(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://mechabay.com", "master-grade", 1),
            "https://mechabay.com/collections/master-grade"
        );
        assert_eq!(
            listing_url("https://mechabay.com/", "/collections/hg/", 2),
            "https://mechabay.com/collections/hg?page=2"
        );
    }

    #[test]
    fn test_listing_links() {
        let page = r#"
            <a href="/collections/master-grade/products/mg-sazabi-ver-ka">Sazabi</a>
            <a href="/products/mg-sazabi-ver-ka?variant=1">Sazabi again</a>
            <a href="/products/">empty</a>
            <a href="/pages/about">About</a>
            <a href="/products/rg-nu-gundam">Nu</a>"#;
        assert_eq!(
            listing_links(page, "https://mechabay.com/collections/master-grade"),
            vec![
                "https://mechabay.com/products/mg-sazabi-ver-ka",
                "https://mechabay.com/products/rg-nu-gundam"
            ]
        );
    }

    #[test]
    fn test_parse_product() {
        let page = r#"
            <meta property="og:title" content="MG 1/100 MSN-04 Sazabi Ver.Ka – Mecha Bay">
            <meta property="og:image" content="//mechabay.com/cdn/sazabi.jpg">
            <meta property="product:price:amount" content="16,500.00">
            <meta property="product:price:currency" content="JPY">
            <div class="product__vendor">BANDAI SPIRITS</div>
            <section class="product__description">
              <p>Char's final mobile suit with full inner frame.</p>
              <p>Series: Char's Counterattack<br>Release Date: 2013-02</p>
              <h3>Accessories</h3><ul><li>Beam Shot Rifle</li><li>Funnels x6</li></ul>
            </section>"#;

        let suit = parse_product(page, "https://mechabay.com/products/mg-sazabi-ver-ka").unwrap();
        assert_eq!(suit.name, "MG 1/100 MSN-04 Sazabi Ver.Ka");
        assert_eq!(suit.grade, Grade::MasterGrade);
        assert_eq!(suit.scale.as_deref(), Some("1/100"));
        assert_eq!(suit.model_number.as_deref(), Some("MSN-04"));
        assert_eq!(suit.manufacturer.as_deref(), Some("BANDAI SPIRITS"));
        assert_eq!(suit.series.as_deref(), Some("Char's Counterattack"));
        assert_eq!(suit.release_date.as_deref(), Some("2013-02"));
        assert_eq!(suit.price_yen, Some(16500));
        assert_eq!(suit.armaments[0].items, vec!["Beam Shot Rifle", "Funnels x6"]);
        assert_eq!(suit.description, "Char's final mobile suit with full inner frame.");
        assert_eq!(suit.image_url.as_deref(), Some("https://mechabay.com/cdn/sazabi.jpg"));
    }

    #[test]
    fn test_strip_store_suffix() {
        assert_eq!(strip_store_suffix("RG Nu Gundam | MechaBay"), "RG Nu Gundam");
        assert_eq!(strip_store_suffix("HG Zaku – Other"), "HG Zaku – Other");
    }
}
