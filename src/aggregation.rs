use tracing::warn;

use crate::anomaly::AnomalyLog;
use crate::error::{CovidDataError, Result};
use crate::model::{AggregateTree, Category, CategoryValue, MergeRole, Region, SubRegion};
use crate::schema::input;

/// Weight given to the newest sample in the exponential smoothing.
pub const ALPHA: f64 = 0.2;

/// One step of the smoothing recurrence.
pub fn smooth(raw: i64, previous: f64) -> f64 {
    ALPHA * raw as f64 + (1.0 - ALPHA) * previous
}

/// Smoothed series for a row of raw counts, starting from zero.
#[cfg(test)]
fn smooth_series(raw: &[i64]) -> Vec<f64> {
    let mut previous = 0.0;
    raw.iter()
        .map(|&value| {
            previous = smooth(value, previous);
            previous
        })
        .collect()
}

/// A parsed CSV data row with enough context to report bad cells.
#[derive(Debug, Clone)]
pub struct CsvRow<'a> {
    pub source_name: &'a str,
    /// 1-based line number in the source file.
    pub line: usize,
    /// `None` marks a cell the row did not supply.
    pub cells: Vec<Option<&'a str>>,
}

impl<'a> CsvRow<'a> {
    fn text(&self, column: usize) -> &'a str {
        self.cells.get(column).copied().flatten().unwrap_or("").trim()
    }

    /// Reads a count cell. Missing cells and "no data" sentinels read as zero;
    /// decimals are truncated toward zero.
    fn count(&self, column: usize) -> Result<i64> {
        let text = self.text(column);
        if input::MISSING_VALUE_SENTINELS
            .iter()
            .any(|sentinel| text.eq_ignore_ascii_case(sentinel))
        {
            return Ok(0);
        }
        if let Ok(value) = text.parse::<i64>() {
            return Ok(value);
        }
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
            _ => Err(CovidDataError::MalformedInput {
                source_name: self.source_name.to_string(),
                line: self.line,
                column: column + 1,
                value: text.to_string(),
            }),
        }
    }
}

/// Folds one CSV row into the tree.
///
/// `date_axis` is the header row of the file; its entries from
/// [`input::FIRST_DATE`] on name the date of each count column.
pub fn merge_row(
    tree: &mut AggregateTree,
    row: &CsvRow<'_>,
    date_axis: &[String],
    category: Category,
    role: MergeRole,
    anomalies: &mut AnomalyLog,
) -> Result<()> {
    let region_name = row.text(input::REGION_NAME).to_uppercase();
    let region_code = row.text(input::REGION_CODE);
    let sub_name = row.text(input::SUBREGION_NAME).to_uppercase();
    let sub_code = row.text(input::SUBREGION_CODE);
    let population = row.count(input::POPULATION)?;

    let mut note = |key: String| {
        if role == MergeRole::Secondary {
            anomalies.note(&format!("{} - {}", key, category.raw_field()));
        }
    };

    let (region, created) =
        tree.region_or_insert_with(region_code, || Region::new(region_name.clone()));
    if created {
        if role == MergeRole::Secondary {
            warn!(
                region = %region_name,
                code = region_code,
                "Region not present in the primary file"
            );
        }
        note(region_name.clone());
    }

    let (sub_region, created) =
        region.sub_region_or_insert_with(sub_code, || SubRegion::new(sub_name.clone(), population));
    if created {
        if role == MergeRole::Secondary {
            warn!(
                region = %region_name,
                sub_region = %sub_name,
                code = sub_code,
                "Sub-region not present in the primary file"
            );
        }
        note(format!("{region_name} - {sub_name}"));
    } else if sub_region.population == 0 {
        sub_region.population = population;
    }

    let mut previous = 0.0;
    for (column, fecha) in date_axis.iter().enumerate().skip(input::FIRST_DATE) {
        let raw = row.count(column)?;
        let smoothed = smooth(raw, previous);
        previous = smoothed;

        let (record, created) = sub_region.daily_or_insert(fecha);
        if created {
            note(format!("{region_name} - {sub_name} - {fecha}"));
        }
        record.set(category, CategoryValue { raw, smoothed });

        if role == MergeRole::Primary {
            for placeholder in Category::ALL.into_iter().filter(|c| *c != category) {
                record.set(placeholder, CategoryValue::default());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn axis(dates: &[&str]) -> Vec<String> {
        ["departamento", "codigo_departamento", "municipio", "codigo_municipio", "poblacion"]
            .iter()
            .chain(dates.iter())
            .map(|s| s.to_string())
            .collect()
    }

    fn row<'a>(cells: &[&'a str]) -> CsvRow<'a> {
        CsvRow {
            source_name: "test.csv",
            line: 2,
            cells: cells.iter().map(|c| Some(*c)).collect(),
        }
    }

    fn log(dir: &TempDir) -> AnomalyLog {
        AnomalyLog::create(dir.path().join("anomalies.log")).expect("anomaly log")
    }

    #[test]
    fn smoothing_follows_recurrence() {
        assert_eq!(smooth_series(&[0, 0, 1]), vec![0.0, 0.0, 0.2]);

        let series = smooth_series(&[5, 10, 0]);
        assert!((series[0] - 1.0).abs() < 1e-12);
        assert!((series[1] - 2.8).abs() < 1e-12);
        assert!((series[2] - 2.24).abs() < 1e-12);
    }

    #[test]
    fn primary_row_builds_tree_with_placeholders() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-09", "2020-06-10", "2020-06-11"]);

        merge_row(
            &mut tree,
            &row(&["Guatemala", "01", "Guatemala", "0101", "1205668", "0", "0", "1"]),
            &dates,
            Category::Tested,
            MergeRole::Primary,
            &mut anomalies,
        )
        .expect("merge");

        let region = tree.region("01").expect("region");
        assert_eq!(region.name, "GUATEMALA");
        let sub = region.sub_region("0101").expect("sub-region");
        assert_eq!(sub.name, "GUATEMALA");
        assert_eq!(sub.population, 1205668);
        assert_eq!(sub.day_count(), 3);

        let smoothed: Vec<f64> = sub
            .daily_records()
            .map(|r| r.get(Category::Tested).smoothed)
            .collect();
        assert_eq!(smoothed, vec![0.0, 0.0, 0.2]);

        let last = sub.daily("2020-06-11").expect("day");
        assert_eq!(last.get(Category::Tested).raw, 1);
        assert_eq!(last.get(Category::Confirmed), CategoryValue::default());
        assert_eq!(last.get(Category::Deceased), CategoryValue::default());

        assert_eq!(anomalies.notes(), 0, "primary pass never logs");
    }

    #[test]
    fn smoothing_resets_per_row() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10", "2020-06-11"]);

        for code in ["0101", "0102"] {
            merge_row(
                &mut tree,
                &row(&["GUATEMALA", "01", "X", code, "10", "5", "5"]),
                &dates,
                Category::Confirmed,
                MergeRole::Secondary,
                &mut anomalies,
            )
            .expect("merge");
        }

        let second = tree.daily("01", "0102", "2020-06-10").expect("day");
        assert!((second.get(Category::Confirmed).smoothed - 1.0).abs() < 1e-12);
    }

    #[test]
    fn secondary_fills_existing_slots_silently() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10"]);

        merge_row(
            &mut tree,
            &row(&["EL PROGRESO", "02", "GUASTATOYA", "0201", "27000", "15"]),
            &dates,
            Category::Tested,
            MergeRole::Primary,
            &mut anomalies,
        )
        .expect("primary");
        merge_row(
            &mut tree,
            &row(&["EL PROGRESO", "02", "GUASTATOYA", "0201", "27000", "5"]),
            &dates,
            Category::Confirmed,
            MergeRole::Secondary,
            &mut anomalies,
        )
        .expect("secondary");

        let day = tree.daily("02", "0201", "2020-06-10").expect("day");
        assert_eq!(day.get(Category::Tested).raw, 15);
        assert_eq!(day.get(Category::Confirmed).raw, 5);
        assert_eq!(day.get(Category::Deceased).raw, 0);
        assert_eq!(anomalies.notes(), 0);
        assert!(!anomalies.path().exists());
    }

    #[test]
    fn secondary_logs_each_new_key() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10", "2020-06-11"]);

        merge_row(
            &mut tree,
            &row(&["Quetzaltenango", "09", "SIN DATOS", "99", "SIN DATO", "1", "0"]),
            &dates,
            Category::Confirmed,
            MergeRole::Secondary,
            &mut anomalies,
        )
        .expect("merge");

        assert_eq!(anomalies.notes(), 4);
        anomalies.persist().expect("persist");
        let content = std::fs::read_to_string(anomalies.path()).expect("log");
        let messages: Vec<&str> = content.lines().map(|l| &l[20..]).collect();
        assert_eq!(
            messages,
            vec![
                "QUETZALTENANGO - casos_confirmados",
                "QUETZALTENANGO - SIN DATOS - casos_confirmados",
                "QUETZALTENANGO - SIN DATOS - 2020-06-10 - casos_confirmados",
                "QUETZALTENANGO - SIN DATOS - 2020-06-11 - casos_confirmados",
            ]
        );
    }

    #[test]
    fn population_is_kept_unless_unset() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10"]);

        let mut merge = |code: &str, population: &str, tree: &mut AggregateTree| {
            merge_row(
                tree,
                &row(&["GUATEMALA", "01", "MIXCO", code, population, "0"]),
                &dates,
                Category::Confirmed,
                MergeRole::Secondary,
                &mut anomalies,
            )
            .expect("merge");
        };

        merge("0108", "500", &mut tree);
        merge("0108", "900", &mut tree);
        merge("0199", "SIN DATO", &mut tree);
        merge("0199", "42", &mut tree);

        let region = tree.region("01").expect("region");
        assert_eq!(region.sub_region("0108").expect("sub").population, 500);
        assert_eq!(region.sub_region("0199").expect("sub").population, 42);
    }

    #[test]
    fn missing_cells_read_as_zero() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10", "2020-06-11", "2020-06-12"]);

        let short = CsvRow {
            source_name: "short.csv",
            line: 3,
            cells: vec![Some("GUATEMALA"), Some("01"), Some("MIXCO"), Some("0108"), None, Some(""), Some("3")],
        };
        merge_row(&mut tree, &short, &dates, Category::Tested, MergeRole::Primary, &mut anomalies)
            .expect("merge");

        let sub = tree.region("01").and_then(|r| r.sub_region("0108")).expect("sub");
        let raw: Vec<i64> = sub.daily_records().map(|r| r.get(Category::Tested).raw).collect();
        assert_eq!(raw, vec![0, 3, 0]);
        assert_eq!(sub.population, 0);
    }

    #[test]
    fn non_numeric_cell_is_malformed() {
        let dir = TempDir::new().expect("temp dir");
        let mut anomalies = log(&dir);
        let mut tree = AggregateTree::new();
        let dates = axis(&["2020-06-10", "2020-06-11"]);

        let err = merge_row(
            &mut tree,
            &row(&["GUATEMALA", "01", "MIXCO", "0108", "10", "1", "dos"]),
            &dates,
            Category::Deceased,
            MergeRole::Secondary,
            &mut anomalies,
        )
        .expect_err("should fail");

        match err {
            CovidDataError::MalformedInput { source_name, line, column, value } => {
                assert_eq!(source_name, "test.csv");
                assert_eq!(line, 2);
                assert_eq!(column, 7);
                assert_eq!(value, "dos");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decimal_cells_truncate() {
        let r = row(&["A", "01", "B", "0101", "12.9"]);
        assert_eq!(r.count(input::POPULATION).expect("count"), 12);
    }
}
