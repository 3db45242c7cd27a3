// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use equipdesk_app::{Category, Record, RecordId, Status, catalog, format_timestamp};
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

const STOCK_REASONS: [&str; 6] = [
    "新购入",
    "月度盘点",
    "归还入库",
    "维修完成",
    "调拨入库",
    "演练结束回收",
];

const DAMAGE_REASONS: [&str; 6] = [
    "外壳开裂",
    "电池鼓包",
    "绳索断裂",
    "密封圈老化",
    "屏幕碎裂",
    "进水无法开机",
];

const IN_USE_REASONS: [&str; 6] = [
    "防汛值守",
    "山地搜救",
    "夜间巡查",
    "火场支援",
    "水域救援演练",
    "社区应急培训",
];

/// Start of the window generated timestamps fall in.
pub const REFERENCE_START: PrimitiveDateTime = datetime!(2025-01-01 0:00);

const WINDOW_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of catalog-consistent equipment records.
#[derive(Debug, Clone)]
pub struct RecordFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl RecordFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn category(&mut self) -> Category {
        Category::ALL[self.rng.int_n(Category::ALL.len())]
    }

    pub fn item_name(&mut self, category: Category) -> &'static str {
        let items = catalog::allowed_items(category);
        items[self.rng.int_n(items.len())]
    }

    pub fn status(&mut self) -> Status {
        Status::ALL[self.rng.int_n(Status::ALL.len())]
    }

    pub fn reason(&mut self, status: Status) -> &'static str {
        let reasons = match status {
            Status::InStock => &STOCK_REASONS,
            Status::Damaged => &DAMAGE_REASONS,
            Status::InUse => &IN_USE_REASONS,
        };
        reasons[self.rng.int_n(reasons.len())]
    }

    pub fn timestamp(&mut self) -> String {
        let offset = (self.rng.next_u64() % (WINDOW_SECONDS as u64)) as i64;
        format_timestamp(REFERENCE_START + Duration::seconds(offset))
    }

    pub fn record(&mut self, id: i64) -> Record {
        let category = self.category();
        let status = self.status();
        Record {
            id: RecordId::new(id),
            category,
            name: self.item_name(category).to_owned(),
            status,
            reason: self.reason(status).to_owned(),
            created_at: self.timestamp(),
        }
    }

    /// Records with ids `1..=count`, in id order.
    pub fn records(&mut self, count: usize) -> Vec<Record> {
        (1..=count as i64).map(|id| self.record(id)).collect()
    }
}

/// Seven hand-written records with known contents: only id 5 is damaged,
/// ids 3 and 5 mention a crack, and id 7 is a lighting item.
pub fn fixture_records() -> Vec<Record> {
    let rows: [(i64, Category, &str, Status, &str, &str); 7] = [
        (1, Category::Medical, "担架", Status::InStock, "月度盘点", "2026-01-03 09:00:00"),
        (2, Category::Communication, "对讲机", Status::InUse, "防汛值守", "2026-01-05 14:30:00"),
        (3, Category::WaterRescue, "皮划艇", Status::InStock, "船体裂纹", "2026-01-08 10:15:00"),
        (4, Category::Firefighting, "灭火器", Status::InStock, "新购入", "2026-01-10 08:00:00"),
        (5, Category::Basic, "安全梯", Status::Damaged, "梯脚开裂", "2026-01-12 16:45:00"),
        (6, Category::Special, "无人机", Status::InUse, "山地搜救", "2026-01-15 07:20:00"),
        (7, Category::Lighting, "手电筒", Status::InUse, "夜间巡查", "2026-01-18 19:00:00"),
    ];
    rows.into_iter()
        .map(|(id, category, name, status, reason, created_at)| Record {
            id: RecordId::new(id),
            category,
            name: name.to_owned(),
            status,
            reason: reason.to_owned(),
            created_at: created_at.to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{RecordFaker, fixture_records};
    use equipdesk_app::{Status, catalog, parse_timestamp};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = RecordFaker::new(42);
        let mut right = RecordFaker::new(42);
        assert_eq!(left.records(5), right.records(5));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(RecordFaker::new(0).seed(), 1);
    }

    #[test]
    fn generated_records_match_catalog() {
        let mut faker = RecordFaker::new(7);
        for record in faker.records(200) {
            assert!(
                catalog::contains(record.category, &record.name),
                "{} is not a {}",
                record.name,
                record.category.as_str()
            );
            assert!(!record.reason.is_empty());
            assert!(parse_timestamp(&record.created_at).is_some());
        }
    }

    #[test]
    fn records_are_numbered_from_one() {
        let mut faker = RecordFaker::new(3);
        let ids: Vec<_> = faker.records(4).iter().map(|record| record.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = RecordFaker::new(seed);
            names.insert(faker.record(1).name);
        }
        assert!(names.len() >= 8, "got {}", names.len());
    }

    #[test]
    fn fixtures_have_single_damaged_record() {
        let records = fixture_records();
        let damaged: Vec<_> = records
            .iter()
            .filter(|record| record.status == Status::Damaged)
            .map(|record| record.id.get())
            .collect();
        assert_eq!(damaged, vec![5]);
        assert!(records
            .iter()
            .all(|record| catalog::contains(record.category, &record.name)));
    }
}
