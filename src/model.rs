use std::collections::HashMap;

use crate::schema::category;

/// One of the three case counts supplied by the input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tested,
    Confirmed,
    Deceased,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Tested, Category::Confirmed, Category::Deceased];

    pub fn index(self) -> usize {
        match self {
            Category::Tested => 0,
            Category::Confirmed => 1,
            Category::Deceased => 2,
        }
    }

    /// Name of the raw daily count field.
    pub fn raw_field(self) -> &'static str {
        match self {
            Category::Tested => category::CASOS_TAMIZADOS,
            Category::Confirmed => category::CASOS_CONFIRMADOS,
            Category::Deceased => category::CASOS_FALLECIDOS,
        }
    }

    /// Name of the exponentially smoothed field.
    pub fn smoothed_field(self) -> &'static str {
        match self {
            Category::Tested => category::EXP_TAMIZADOS,
            Category::Confirmed => category::EXP_CONFIRMADOS,
            Category::Deceased => category::EXP_FALLECIDOS,
        }
    }
}

/// How an ingestion pass relates to the rest of the merge.
///
/// The primary file seeds every date slot with placeholders for the other
/// categories and never reports anomalies. Secondary files are expected to
/// hit keys the primary already created; new keys they introduce are noted
/// in the anomaly log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRole {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryValue {
    pub raw: i64,
    pub smoothed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub fecha: String,
    values: [CategoryValue; 3],
}

impl DailyRecord {
    pub fn new(fecha: impl Into<String>) -> Self {
        Self {
            fecha: fecha.into(),
            values: [CategoryValue::default(); 3],
        }
    }

    pub fn get(&self, category: Category) -> CategoryValue {
        self.values[category.index()]
    }

    pub fn set(&mut self, category: Category, value: CategoryValue) {
        self.values[category.index()] = value;
    }
}

/// Entries keyed by code, iterated in first-seen order.
#[derive(Debug, Clone)]
struct OrderedEntries<T> {
    items: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> OrderedEntries<T> {
    fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.items[i].1)
    }

    /// Returns the entry for `key`, inserting `make()` first if absent.
    /// The flag is true when the entry was created by this call.
    fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> T) -> (&mut T, bool) {
        let (i, created) = match self.index.get(key).copied() {
            Some(i) => (i, false),
            None => {
                let i = self.items.len();
                self.items.push((key.to_string(), make()));
                self.index.insert(key.to_string(), i);
                (i, true)
            }
        };
        (&mut self.items[i].1, created)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone)]
pub struct SubRegion {
    pub name: String,
    pub population: i64,
    daily: OrderedEntries<DailyRecord>,
}

impl SubRegion {
    pub fn new(name: impl Into<String>, population: i64) -> Self {
        Self {
            name: name.into(),
            population,
            daily: OrderedEntries::default(),
        }
    }

    #[cfg(test)]
    pub fn daily(&self, fecha: &str) -> Option<&DailyRecord> {
        self.daily.get(fecha)
    }

    pub fn daily_records(&self) -> impl Iterator<Item = &DailyRecord> {
        self.daily.iter().map(|(_, record)| record)
    }

    pub fn day_count(&self) -> usize {
        self.daily.len()
    }

    pub fn daily_or_insert(&mut self, fecha: &str) -> (&mut DailyRecord, bool) {
        self.daily.get_or_insert_with(fecha, || DailyRecord::new(fecha))
    }
}

#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    sub_regions: OrderedEntries<SubRegion>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_regions: OrderedEntries::default(),
        }
    }

    pub fn sub_region(&self, code: &str) -> Option<&SubRegion> {
        self.sub_regions.get(code)
    }

    /// Sub-regions as `(code, sub-region)` in first-seen order.
    pub fn sub_regions(&self) -> impl Iterator<Item = (&str, &SubRegion)> {
        self.sub_regions.iter()
    }

    pub fn sub_region_count(&self) -> usize {
        self.sub_regions.len()
    }

    pub fn sub_region_or_insert_with(
        &mut self,
        code: &str,
        make: impl FnOnce() -> SubRegion,
    ) -> (&mut SubRegion, bool) {
        self.sub_regions.get_or_insert_with(code, make)
    }
}

/// Region → sub-region → date tree shared by the three ingestion passes.
///
/// Built monotonically: entries are added or updated, never removed.
#[derive(Debug, Clone, Default)]
pub struct AggregateTree {
    regions: OrderedEntries<Region>,
}

impl AggregateTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.get(code)
    }

    /// Regions as `(code, region)` in first-seen order.
    pub fn regions(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn sub_region_count(&self) -> usize {
        self.regions
            .iter()
            .map(|(_, region)| region.sub_region_count())
            .sum()
    }

    pub fn region_or_insert_with(
        &mut self,
        code: &str,
        make: impl FnOnce() -> Region,
    ) -> (&mut Region, bool) {
        self.regions.get_or_insert_with(code, make)
    }

    #[cfg(test)]
    pub fn daily(&self, region: &str, sub_region: &str, fecha: &str) -> Option<&DailyRecord> {
        self.region(region)?.sub_region(sub_region)?.daily(fecha)
    }
}
