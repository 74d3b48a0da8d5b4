use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::models::{ArResult, DesignResult, FurnitureItem, FurnitureListResponse};

pub const SHOPPING_SEARCH_BASE: &str = "https://s.taobao.com/search";
const CHART_NAME_LIMIT: usize = 6;
const CHART_COLORS: [&str; 2] = ["#6366f1", "#818cf8"];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartBar {
    pub name: String,
    pub price: f64,
    pub color: &'static str,
}

/// One bar per item, in list order.
pub fn chart_data(list: &FurnitureListResponse) -> Vec<ChartBar> {
    list.items
        .iter()
        .enumerate()
        .map(|(idx, item)| ChartBar {
            name: chart_label(&item.name),
            price: item.estimated_price,
            color: CHART_COLORS[idx % CHART_COLORS.len()],
        })
        .collect()
}

fn chart_label(name: &str) -> String {
    if name.chars().count() > CHART_NAME_LIMIT {
        let head: String = name.chars().take(CHART_NAME_LIMIT).collect();
        format!("{head}..")
    } else {
        name.to_string()
    }
}

/// Search URL for the item's keyword on the shopping site.
pub fn shopping_link(search_query: &str) -> String {
    match Url::parse_with_params(SHOPPING_SEARCH_BASE, &[("q", search_query.trim())]) {
        Ok(url) => url.into(),
        Err(_) => SHOPPING_SEARCH_BASE.to_string(),
    }
}

fn format_amount(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 { format!("-{grouped}") } else { grouped }
}

pub fn price_range_label(item: &FurnitureItem) -> String {
    format!("¥ {} - {}", format_amount(item.price_min), format_amount(item.price_max))
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemCard {
    pub category: String,
    pub name: String,
    pub price_range: String,
    pub estimated_price: String,
    pub shopping_url: String,
    pub buying_tip: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub currency: String,
    pub total: String,
    pub range: String,
    pub items: Vec<ItemCard>,
    pub chart: Vec<ChartBar>,
}

pub fn cost_summary(list: &FurnitureListResponse) -> CostSummary {
    CostSummary {
        currency: list.currency.clone(),
        total: format!("{} {}", list.currency, format_amount(list.total_estimated_cost)),
        range: format!("{} - {}", format_amount(list.total_min_cost), format_amount(list.total_max_cost)),
        items: list
            .items
            .iter()
            .map(|item| ItemCard {
                category: item.category.clone(),
                name: item.name.clone(),
                price_range: price_range_label(item),
                estimated_price: format!("¥ {}", format_amount(item.estimated_price)),
                shopping_url: shopping_link(&item.search_query),
                buying_tip: item.buying_tip.clone(),
            })
            .collect(),
        chart: chart_data(list),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Design,
    Ar,
}

/// Background music plays while the active tab is showing a result.
pub fn ambient_audio_active(tab: Tab, design: &DesignResult, ar_has_result: bool) -> bool {
    match tab {
        Tab::Design => !design.is_empty(),
        Tab::Ar => ar_has_result,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub style: String,
    pub focus_label: &'static str,
    pub timestamp: DateTime<Utc>,
    pub has_image: bool,
    pub selected: bool,
}

pub fn history_entries(history: &[ArResult], selected: Option<Uuid>) -> Vec<HistoryEntry> {
    history
        .iter()
        .map(|r| HistoryEntry {
            id: r.id,
            style: r.style.clone(),
            focus_label: r.focus_area.short_label(),
            timestamp: r.timestamp,
            has_image: r.generated_image.is_some(),
            selected: selected == Some(r.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_furniture_list;
    use crate::testing::SAMPLE_LIST;
    use pretty_assertions::assert_eq;

    #[test]
    fn chart_truncates_long_names_by_character() {
        let mut list = parse_furniture_list(SAMPLE_LIST).unwrap();
        list.items[0].name = "北欧极简布艺沙发".into();
        let chart = chart_data(&list);
        assert_eq!(chart[0].name, "北欧极简布艺..");
        assert_eq!(chart[1].name, "实木餐桌");
        assert_eq!(chart[0].color, "#6366f1");
        assert_eq!(chart[1].color, "#818cf8");
        assert_eq!(chart[1].price, 4000.0);
    }

    #[test]
    fn shopping_link_encodes_the_keyword() {
        let link = shopping_link("北欧 沙发&茶几");
        assert!(link.starts_with("https://s.taobao.com/search?q="));
        assert!(!link.contains(' '));
        assert!(link.contains("%26"));
        let parsed = Url::parse(&link).unwrap();
        let (_, q) = parsed.query_pairs().next().unwrap();
        assert_eq!(q, "北欧 沙发&茶几");
    }

    #[test]
    fn formats_amounts_with_grouping() {
        assert_eq!(format_amount(1234567.4), "1,234,567");
        assert_eq!(format_amount(999.0), "999");
        let list = parse_furniture_list(SAMPLE_LIST).unwrap();
        let summary = cost_summary(&list);
        assert_eq!(summary.total, "CNY 9,800");
        assert_eq!(summary.range, "7,000 - 14,000");
        assert_eq!(summary.items[0].price_range, "¥ 4,000 - 8,000");
    }

    #[test]
    fn audio_follows_the_active_tab() {
        let empty = DesignResult::default();
        let with_image = DesignResult { image_url: Some("data:image/png;base64,AA".into()), ..Default::default() };
        assert!(!ambient_audio_active(Tab::Design, &empty, true));
        assert!(ambient_audio_active(Tab::Design, &with_image, false));
        assert!(ambient_audio_active(Tab::Ar, &empty, true));
    }
}
