// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Fixed mapping from equipment category to the item names it allows.

use crate::{Category, LookupError};

const LIGHTING: [&str; 3] = ["照明车", "手电筒", "灯具及配件"];
const COMMUNICATION: [&str; 1] = ["对讲机"];
const MEDICAL: [&str; 8] = [
    "担架",
    "酒精",
    "防护服",
    "夹板",
    "医疗口罩",
    "放毒面具",
    "医疗包",
    "急救药箱",
];
const WATER_RESCUE: [&str; 5] = ["皮划艇", "马达", "发动机", "快艇", "救生衣"];
const SPECIAL: [&str; 3] = ["运输车", "探测仪", "无人机"];
const FIREFIGHTING: [&str; 6] = ["灭火器", "铁锹", "锤子", "消防栓扳手", "撬棍", "斧子"];
const BASIC: [&str; 10] = [
    "五金工具箱",
    "安全梯",
    "便携雨衣",
    "喇叭",
    "水桶",
    "反光背心",
    "布手套",
    "一次性手套",
    "毛巾",
    "安全标志牌",
];

pub const fn allowed_items(category: Category) -> &'static [&'static str] {
    match category {
        Category::Lighting => &LIGHTING,
        Category::Communication => &COMMUNICATION,
        Category::Medical => &MEDICAL,
        Category::WaterRescue => &WATER_RESCUE,
        Category::Special => &SPECIAL,
        Category::Firefighting => &FIREFIGHTING,
        Category::Basic => &BASIC,
    }
}

pub fn allowed_items_for_label(label: &str) -> Result<&'static [&'static str], LookupError> {
    Category::parse(label)
        .map(allowed_items)
        .ok_or_else(|| LookupError::UnknownCategory(label.to_owned()))
}

pub fn contains(category: Category, name: &str) -> bool {
    allowed_items(category).contains(&name)
}

/// Flattened item names for `categories`, in catalog order, without
/// duplicates. Empty input gives no names.
pub fn union<I>(categories: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = Category>,
{
    let mut names: Vec<&'static str> = Vec::new();
    for category in categories {
        for &name in allowed_items(category) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::{allowed_items, allowed_items_for_label, contains, union};
    use crate::{Category, LookupError};

    #[test]
    fn every_category_has_items() {
        for category in Category::ALL {
            assert!(!allowed_items(category).is_empty(), "{category:?}");
        }
    }

    #[test]
    fn lighting_items_keep_catalog_order() {
        assert_eq!(
            allowed_items(Category::Lighting),
            &["照明车", "手电筒", "灯具及配件"]
        );
    }

    #[test]
    fn unknown_label_is_rejected() {
        let error = allowed_items_for_label("厨房设备").expect_err("unknown label");
        assert_eq!(error, LookupError::UnknownCategory("厨房设备".to_owned()));
    }

    #[test]
    fn union_is_exact_and_deduplicated() {
        let names = union([Category::Lighting, Category::Communication, Category::Lighting]);
        assert_eq!(names, vec!["照明车", "手电筒", "灯具及配件", "对讲机"]);
        assert!(union(Vec::<Category>::new()).is_empty());
    }

    #[test]
    fn contains_checks_membership_per_category() {
        assert!(contains(Category::Medical, "担架"));
        assert!(!contains(Category::Lighting, "担架"));
    }
}
