//! gundam.fandom.com 页面解析
//!
//! 分类成员列表、势力页、百科机体页与人物页。

use crate::error::{AppError, Result};
use crate::models::{ArmamentGroup, Faction, Force, LoreCharacter, LoreMobileSuit, SpecTable};
use crate::scraper::clean;
use crate::scraper::html::{self, InfoboxField};

/// 分类页地址
pub fn category_url(base_url: &str, category: &str) -> String {
    let category = category.trim().trim_start_matches("Category:");
    format!(
        "{}/wiki/Category:{}",
        base_url.trim_end_matches('/'),
        clean::title_to_path(category)
    )
}

/// 分类页中的成员页面链接（绝对地址，去重）
pub fn category_members(page: &str, page_url: &str) -> Vec<String> {
    let tagged: Vec<_> = html::tag_blocks_ci(page, "<a ", "</a>")
        .into_iter()
        .filter(|a| {
            html::attr(a, "class").is_some_and(|c| c.contains("category-page__member-link"))
        })
        .filter_map(|a| html::attr(a, "href"))
        .collect();

    let hrefs: Vec<String> = if tagged.is_empty() {
        html::links(page).into_iter().map(|l| l.href).collect()
    } else {
        tagged
    };

    let mut members: Vec<String> = Vec::new();
    for href in hrefs {
        if !is_article_link(&href) {
            continue;
        }
        let url = clean::absolute_url(page_url, &href);
        if !members.contains(&url) {
            members.push(url);
        }
    }
    members
}

/// 分类页的下一页链接
pub fn next_category_page(page: &str, page_url: &str) -> Option<String> {
    html::tag_blocks_ci(page, "<a ", "</a>")
        .into_iter()
        .find(|a| {
            html::attr(a, "class").is_some_and(|c| c.contains("category-page__pagination-next"))
                || html::attr(a, "rel").is_some_and(|r| r.eq_ignore_ascii_case("next"))
        })
        .and_then(|a| html::attr(a, "href"))
        .map(|href| clean::absolute_url(page_url, &href))
}

/// 只接受正文命名空间的 wiki 页面
fn is_article_link(href: &str) -> bool {
    let path = href.split("/wiki/").nth(1);
    match path {
        Some(title) => !title.is_empty() && !title.contains(':') && !title.contains('?'),
        None => false,
    }
}

/// 信息框字段的可消费视图
struct Infobox {
    fields: Vec<InfoboxField>,
}

impl Infobox {
    fn parse(page: &str) -> Self {
        Self {
            fields: html::infobox(page),
        }
    }

    /// 按 `data-source` 取出第一个匹配的字段
    fn take(&mut self, sources: &[&str]) -> Option<InfoboxField> {
        let idx = self.fields.iter().position(|f| {
            sources
                .iter()
                .any(|s| f.source.eq_ignore_ascii_case(s))
        })?;
        Some(self.fields.remove(idx))
    }

    fn take_text(&mut self, sources: &[&str]) -> Option<String> {
        self.take(sources)
            .map(|f| clean::clean_name(&f.text()))
            .filter(|t| !t.is_empty())
    }

    fn take_list(&mut self, sources: &[&str]) -> Vec<String> {
        self.take(sources)
            .map(|f| clean::clean_lines(&f.values))
            .unwrap_or_default()
    }

    /// 剩余字段转为有序键值表
    fn into_table(self) -> SpecTable {
        self.fields
            .into_iter()
            .map(|f| {
                let value = clean::strip_footnotes(&f.text());
                (f.label, value)
            })
            .collect()
    }
}

fn page_name(infobox: &mut Infobox, page: &str, url: &str) -> Result<String> {
    infobox
        .take_text(&["name", "title"])
        .or_else(|| html::page_title(page).map(|t| clean::strip_footnotes(&t)))
        .or_else(|| clean::url_to_title(url))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Scrape(format!("{} 缺少页面标题", url)))
}

fn description(page: &str) -> String {
    html::first_paragraph(page)
        .map(|p| clean::strip_footnotes(&p))
        .unwrap_or_default()
}

fn image(page: &str) -> Option<String> {
    html::meta_content(page, "og:image").filter(|u| !u.is_empty())
}

/// 势力页
pub fn parse_faction(page: &str, url: &str) -> Result<Faction> {
    let mut infobox = Infobox::parse(page);
    let name = page_name(&mut infobox, page, url)?;

    let mut faction = Faction::new(&name);
    faction.era = infobox
        .take_text(&["era", "timeline", "universe"])
        .unwrap_or_default();
    faction.leaders = infobox.take_list(&["leader", "leaders", "head"]);
    faction.allies = infobox.take_list(&["allies", "ally"]);
    faction.enemies = infobox.take_list(&["enemies", "enemy"]);
    faction.headquarters = infobox.take_text(&["headquarters", "hq", "base"]);
    faction.description = description(page);
    faction.forces = forces(page);
    faction.image_url = image(page);
    faction.source_url = Some(url.to_string());
    Ok(faction)
}

/// 军事组织段落：每个三级标题是一支部队，其列表项是下属单位
fn forces(page: &str) -> Vec<Force> {
    let sections = html::sections(page);
    let Some(parent) = sections.iter().find(|s| {
        s.level == 2
            && ["forces", "military", "organization", "military forces"]
                .iter()
                .any(|h| s.heading.eq_ignore_ascii_case(h))
    }) else {
        return Vec::new();
    };

    html::sections(parent.html)
        .into_iter()
        .filter(|s| s.level == 3)
        .map(|s| {
            let teams = html::tag_blocks_ci(s.html, "<li", "</li>")
                .into_iter()
                .map(|li| clean::clean_name(&html::strip_tags(html::inner_after_open_tag(li))))
                .filter(|t| !t.is_empty())
                .collect();
            Force::new(&clean::clean_name(&s.heading), teams)
        })
        .filter(|f| !f.name.is_empty())
        .collect()
}

/// 百科机体页
pub fn parse_lore_suit(page: &str, url: &str) -> Result<LoreMobileSuit> {
    let mut infobox = Infobox::parse(page);
    let name = page_name(&mut infobox, page, url)?;

    let mut suit = LoreMobileSuit::new(url, &clean::clean_name(&name));
    suit.model_number = infobox
        .take_text(&["model", "model_number", "model number"])
        .or_else(|| clean::model_number(&name));
    suit.manufacturer = infobox.take_text(&["manufacturer", "developer", "manufacturers"]);
    suit.faction = infobox.take_text(&["operator", "affiliation", "operators"]);
    suit.series = infobox.take_text(&["first_seen", "appearance", "series", "first seen"]);
    suit.pilots = infobox.take_list(&["pilots", "known_pilots", "pilot"]);

    let mut armaments = Vec::new();
    let fixed = infobox.take_list(&["fixed_armaments", "armaments", "armament"]);
    if !fixed.is_empty() {
        armaments.push(ArmamentGroup::new("Fixed Armaments", fixed));
    }
    let optional = infobox.take_list(&["optional_armaments", "optional_equipment", "optional"]);
    if !optional.is_empty() {
        armaments.push(ArmamentGroup::new("Optional Armaments", optional));
    }
    if armaments.is_empty() {
        armaments = armament_sections(page);
    }

    infobox.take(&["image", "image1", "caption"]);
    suit.armaments = armaments;
    suit.description = description(page);
    suit.image_url = image(page);
    suit.specs = infobox.into_table();
    Ok(suit)
}

/// 正文中的 Armaments 段落：每个子标题是一种武装
fn armament_sections(page: &str) -> Vec<ArmamentGroup> {
    let Some(section) = html::section(page, "Armaments") else {
        return Vec::new();
    };
    let items: Vec<String> = html::sections(section.html)
        .into_iter()
        .filter(|s| s.level > section.level)
        .map(|s| clean::clean_name(&s.heading))
        .filter(|h| !h.is_empty())
        .collect();

    if items.is_empty() {
        Vec::new()
    } else {
        vec![ArmamentGroup::new("Armaments", items)]
    }
}

/// 人物页
pub fn parse_character(page: &str, url: &str) -> Result<LoreCharacter> {
    let mut infobox = Infobox::parse(page);
    let name = page_name(&mut infobox, page, url)?;

    let mut character = LoreCharacter::new(url, &clean::clean_name(&name));
    character.affiliation = infobox.take_text(&["affiliation", "affiliations", "faction"]);
    character.rank = infobox.take_text(&["rank", "ranks"]);
    character.mobile_suits =
        infobox.take_list(&["mobile_suits", "mobile_weapons", "machines", "mobile suits"]);
    infobox.take(&["image", "image1", "caption"]);
    character.description = description(page);
    character.image_url = image(page);
    character.profile = infobox.into_table();
    Ok(character)
}
