#![allow(dead_code, reason = "each integration test binary uses a subset of the helpers")]

use topologyx_core::{DataSource, DataSourceError, PointCloud};

/// Two unit squares five units apart along the diagonal.
#[must_use]
pub fn two_squares() -> PointCloud {
    PointCloud::from_rows(
        "two-squares",
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![6.0, 5.0],
            vec![5.0, 6.0],
            vec![6.0, 6.0],
        ],
    )
    .expect("rows are valid")
}

/// Points on the real line, stored without validation.
#[derive(Clone, Debug)]
pub struct Line {
    coords: Vec<[f64; 1]>,
}

impl Line {
    #[must_use]
    pub fn new(values: &[f64]) -> Self {
        Self {
            coords: values.iter().map(|&value| [value]).collect(),
        }
    }
}

impl DataSource for Line {
    fn len(&self) -> usize {
        self.coords.len()
    }

    fn name(&self) -> &str {
        "line"
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn point(&self, index: usize) -> Result<&[f64], DataSourceError> {
        self.coords
            .get(index)
            .map(|coords| coords.as_slice())
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}
