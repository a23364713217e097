use super::model::{ProfileDataset, Variable};
use crate::error::{ProfileError, Result};

// ---------------------------------------------------------------------------
// Flattened series: one dive cycle of one variable as a 1-D stream
// ---------------------------------------------------------------------------

/// A variable's dive-cycle slice flattened to one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub units: Option<String>,
}

impl FlatSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finite min/max, `None` when no value is finite.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Slice dive cycle `cycle` out of `var` and flatten the trailing dimensions.
///
/// * rank >= 2 → the `cycle`-th slice along the leading dimension
/// * rank 1    → the whole stream (one cycle)
/// * rank 0    → the single scalar (one cycle)
pub fn flatten_cycle(var: &Variable, cycle: usize) -> Result<FlatSeries> {
    let cycles = var.cycles();
    if cycle >= cycles {
        return Err(ProfileError::CycleOutOfRange {
            name: var.name.clone(),
            cycle,
            cycles,
        });
    }

    let len = var.cycle_len();
    let start = cycle * len;
    let values = var.values[start..start + len].to_vec();

    Ok(FlatSeries {
        name: var.name.clone(),
        values,
        units: var.units().map(str::to_string),
    })
}

/// Look up `name` and flatten its `cycle`-th slice.
pub fn extract(dataset: &ProfileDataset, name: &str, cycle: usize) -> Result<FlatSeries> {
    let var = dataset.variable(name)?;
    flatten_cycle(var, cycle)
}

/// Variables that can colour a panel against `reference` for the given cycle:
/// numeric, holding the cycle, and with a matching sample count.
pub fn plottable_variables(dataset: &ProfileDataset, reference: &str, cycle: usize) -> Vec<String> {
    let Ok(reference_var) = dataset.variable(reference) else {
        return Vec::new();
    };
    let expected = reference_var.cycle_len();
    dataset
        .variables
        .values()
        .filter(|v| v.cycle_len() == expected && cycle < v.cycles())
        .map(|v| v.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycles_dataset() -> ProfileDataset {
        // 2 dive cycles x 3 samples
        let time = Variable::new("time", vec![2, 3], vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]).unwrap();
        let depth = Variable::new("depth", vec![2, 3], vec![0.0, 5.0, 10.0, 1.0, 6.0, 11.0]).unwrap();
        let grid = Variable::new("grid", vec![2, 3, 1], vec![7.0; 6]).unwrap();
        let lat = Variable::from_series("precise_lat", vec![40.0, 40.1]);
        ProfileDataset::from_variables("mem", vec![time, depth, grid, lat])
    }

    #[test]
    fn flattening_yields_cycle_length() {
        let ds = cycles_dataset();
        for name in ["time", "depth", "grid"] {
            let series = extract(&ds, name, 0).unwrap();
            assert_eq!(series.len(), 3, "{name}");
        }
    }

    #[test]
    fn selects_requested_cycle() {
        let ds = cycles_dataset();
        assert_eq!(extract(&ds, "time", 0).unwrap().values, vec![0.0, 1.0, 2.0]);
        assert_eq!(extract(&ds, "time", 1).unwrap().values, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn rank_one_is_a_single_cycle() {
        let ds = cycles_dataset();
        assert_eq!(extract(&ds, "precise_lat", 0).unwrap().values, vec![40.0, 40.1]);
        assert_eq!(
            extract(&ds, "precise_lat", 1).unwrap_err(),
            ProfileError::CycleOutOfRange {
                name: "precise_lat".into(),
                cycle: 1,
                cycles: 1
            }
        );
    }

    #[test]
    fn missing_variable_propagates() {
        let ds = cycles_dataset();
        assert!(matches!(
            extract(&ds, "dissolved_nitrate", 0),
            Err(ProfileError::VariableNotFound { .. })
        ));
    }

    #[test]
    fn plottable_filters_by_length() {
        let ds = cycles_dataset();
        assert_eq!(plottable_variables(&ds, "time", 0), vec!["depth", "grid", "time"]);
        assert!(plottable_variables(&ds, "absent", 0).is_empty());
    }

    #[test]
    fn finite_range_ignores_nan() {
        let series = FlatSeries {
            name: "nitrate".into(),
            values: vec![f64::NAN, 3.0, -1.0, f64::INFINITY],
            units: None,
        };
        assert_eq!(series.finite_range(), Some((-1.0, 3.0)));
    }
}
