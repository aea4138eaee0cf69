//! Flattening of the aggregate tree into one record per (region, sub-region, date).

use serde::Serialize;

use crate::model::{AggregateTree, Category, DailyRecord, Region, SubRegion};
use crate::schema::record;

/// One output line. Field order is the NDJSON key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord<'a> {
    pub departamento: &'a str,
    pub municipio: &'a str,
    pub poblacion: i64,
    pub fecha: &'a str,
    pub casos_tamizados: i64,
    pub exp_tamizados: f64,
    pub casos_confirmados: i64,
    pub exp_confirmados: f64,
    pub casos_fallecidos: i64,
    pub exp_fallecidos: f64,
}

impl<'a> FlatRecord<'a> {
    fn new(
        region: &'a Region,
        sub_region: &'a SubRegion,
        poblacion: i64,
        day: &'a DailyRecord,
    ) -> Self {
        let tested = day.get(Category::Tested);
        let confirmed = day.get(Category::Confirmed);
        let deceased = day.get(Category::Deceased);
        Self {
            departamento: &region.name,
            municipio: &sub_region.name,
            poblacion,
            fecha: &day.fecha,
            casos_tamizados: tested.raw,
            exp_tamizados: tested.smoothed,
            casos_confirmados: confirmed.raw,
            exp_confirmados: confirmed.smoothed,
            casos_fallecidos: deceased.raw,
            exp_fallecidos: deceased.smoothed,
        }
    }
}

/// Walks the tree in first-seen order.
///
/// Population is carried only by the first record of each sub-region; the
/// rest report `0`. Sub-region entries keyed by the region-name label are
/// skipped.
pub fn flatten(tree: &AggregateTree) -> impl Iterator<Item = FlatRecord<'_>> {
    tree.regions().flat_map(|(_, region)| {
        region
            .sub_regions()
            .filter(|(code, _)| *code != record::DEPARTAMENTO)
            .flat_map(move |(_, sub_region)| {
                sub_region.daily_records().enumerate().map(move |(i, day)| {
                    let poblacion = if i == 0 { sub_region.population } else { 0 };
                    FlatRecord::new(region, sub_region, poblacion, day)
                })
            })
    })
}
