//! Dimension-0 persistence of a vertex and edge filtration, either a
//! [`ModeFiltration`] or any graph with per-vertex values.
//!
//! Each vertex opens a connected component. An edge joining two components
//! closes the younger one at the edge's value (elder rule); components still
//! open after the last edge are essential and never die.
//!
//! An edge cannot appear before its endpoints, so it is processed at the larger
//! of its own value and both endpoint values.

use crate::{
    filtration::{FiltrationEdge, ModeFiltration},
    union_find::UnionFind,
};

/// A `[birth, death)` interval of one connected component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PersistenceInterval {
    /// Filtration value at which the component appeared.
    pub birth: f64,
    /// Filtration value at which it merged into an older one, or `+inf`.
    pub death: f64,
}

impl PersistenceInterval {
    /// Lifetime of the component.
    #[must_use]
    pub fn persistence(&self) -> f64 {
        self.death - self.birth
    }

    /// Whether the component never dies.
    #[must_use]
    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }
}

/// Connected-component intervals of a filtration.
///
/// Finite intervals come first in the order they closed; essential intervals
/// follow, ordered by birth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersistenceDiagram {
    intervals: Vec<PersistenceInterval>,
}

#[derive(Clone, Copy)]
enum Simplex {
    Vertex(usize),
    Edge(usize),
}

impl PersistenceDiagram {
    /// Computes dimension-0 persistence of `filtration`.
    ///
    /// Zero-length intervals are dropped.
    #[must_use]
    pub fn from_filtration(filtration: &ModeFiltration) -> Self {
        let values: Vec<f64> = (0..filtration.len())
            .map(|point| filtration.vertex_value(point).unwrap_or(f64::INFINITY))
            .collect();
        Self::from_graph(&values, filtration.vertex_order(), filtration.edges())
    }

    /// Computes dimension-0 persistence of a graph whose vertex `p` enters at
    /// `values[p]`.
    ///
    /// `order` lists every vertex by ascending value, ties by index, and
    /// `edges` is sorted by value. Zero-length intervals are dropped.
    pub(crate) fn from_graph(values: &[f64], order: &[usize], edges: &[FiltrationEdge]) -> Self {
        let value_of = |point: usize| values.get(point).copied().unwrap_or(f64::INFINITY);

        let mut simplices: Vec<(f64, Simplex)> = order
            .iter()
            .map(|&point| (value_of(point), Simplex::Vertex(point)))
            .collect();
        simplices.extend(edges.iter().enumerate().map(|(position, edge)| {
            let appears = edge
                .value
                .max(value_of(edge.source))
                .max(value_of(edge.target));
            (appears, Simplex::Edge(position))
        }));
        // Stable: vertex order and edge order are already sorted within kind.
        simplices.sort_by(|(a, left), (b, right)| {
            a.total_cmp(b).then_with(|| match (left, right) {
                (Simplex::Vertex(_), Simplex::Edge(_)) => std::cmp::Ordering::Less,
                (Simplex::Edge(_), Simplex::Vertex(_)) => std::cmp::Ordering::Greater,
                _ => std::cmp::Ordering::Equal,
            })
        });

        let mut rank = vec![0_usize; values.len()];
        for (position, &point) in order.iter().enumerate() {
            rank[point] = position;
        }
        let mut components = UnionFind::with_capacity(values.len());
        // Oldest point of the component rooted at each object.
        let mut elder: Vec<usize> = (0..values.len()).collect();
        let mut intervals = Vec::new();

        for (value, simplex) in simplices {
            let edge = match simplex {
                Simplex::Vertex(point) => {
                    components.find(&point);
                    continue;
                }
                Simplex::Edge(position) => edges[position],
            };
            let left = components.find(&edge.source);
            let right = components.find(&edge.target);
            if left == right {
                continue;
            }

            let (left_elder, right_elder) = (elder[left], elder[right]);
            // Earlier in vertex order is older; equal values already favour the lower index.
            let (survivor, victim) = if rank[left_elder] < rank[right_elder] {
                (left_elder, right_elder)
            } else {
                (right_elder, left_elder)
            };
            let birth = value_of(victim);
            if value > birth {
                intervals.push(PersistenceInterval {
                    birth,
                    death: value,
                });
            }
            let root = components.union(&left, &right);
            elder[root] = survivor;
        }

        let mut essential: Vec<PersistenceInterval> = components
            .sets()
            .into_iter()
            .map(|(root, _)| PersistenceInterval {
                birth: value_of(elder[root]),
                death: f64::INFINITY,
            })
            .collect();
        essential.sort_by(|a, b| a.birth.total_cmp(&b.birth));
        intervals.extend(essential);

        Self { intervals }
    }

    /// All intervals, finite first.
    #[must_use]
    pub fn intervals(&self) -> &[PersistenceInterval] {
        &self.intervals
    }

    /// Drops the essential intervals, keeping finite ones in closing order.
    #[must_use]
    pub fn into_finite(mut self) -> Self {
        self.intervals.retain(|interval| !interval.is_essential());
        self
    }

    /// Number of components that never die.
    #[must_use]
    pub fn essential_count(&self) -> usize {
        self.intervals
            .iter()
            .filter(|interval| interval.is_essential())
            .count()
    }

    /// Sum of finite lifetimes.
    #[must_use]
    pub fn total_persistence(&self) -> f64 {
        self.finite().map(|interval| interval.persistence()).sum()
    }

    /// Longest finite lifetime, or `None` when every interval is essential.
    #[must_use]
    pub fn max_persistence(&self) -> Option<f64> {
        self.finite()
            .map(|interval| interval.persistence())
            .reduce(f64::max)
    }

    fn finite(&self) -> impl Iterator<Item = &PersistenceInterval> {
        self.intervals
            .iter()
            .filter(|interval| !interval.is_essential())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FixedNeighbors;

    fn path_filtration(densities: Vec<f64>) -> ModeFiltration {
        let path = FixedNeighbors::new(vec![vec![1], vec![0, 2], vec![1]]);
        ModeFiltration::build(densities, &path, 2).expect("filtration builds")
    }

    #[test]
    fn younger_peak_dies_at_the_saddle() {
        let diagram = path_filtration(vec![3.0, 1.0, 2.0]).persistence();

        assert_eq!(
            diagram.intervals(),
            [
                PersistenceInterval { birth: -2.0, death: -1.0 },
                PersistenceInterval { birth: -3.0, death: f64::INFINITY },
            ]
        );
        assert_eq!(diagram.essential_count(), 1);
        assert!((diagram.total_persistence() - 1.0).abs() < 1e-12);
        assert_eq!(diagram.max_persistence(), Some(1.0));
    }

    #[test]
    fn monotone_path_has_only_the_essential_class() {
        let diagram = path_filtration(vec![3.0, 2.0, 1.0]).persistence();

        assert_eq!(diagram.intervals().len(), 1);
        assert_eq!(diagram.essential_count(), 1);
        assert_eq!(diagram.max_persistence(), None);
        assert_eq!(diagram.total_persistence(), 0.0);
    }

    #[test]
    fn disconnected_points_are_all_essential() {
        let isolated = FixedNeighbors::new(vec![vec![], vec![], vec![]]);
        let filtration =
            ModeFiltration::build(vec![1.0, 2.0, 3.0], &isolated, 2).expect("filtration builds");

        let diagram = filtration.persistence();

        assert_eq!(diagram.essential_count(), 3);
        let births: Vec<f64> = diagram.intervals().iter().map(|i| i.birth).collect();
        assert_eq!(births, [-3.0, -2.0, -1.0]);
    }

    #[test]
    fn finite_view_drops_essential_classes() {
        let diagram = path_filtration(vec![3.0, 1.0, 2.0]).persistence().into_finite();

        assert_eq!(
            diagram.intervals(),
            [PersistenceInterval { birth: -2.0, death: -1.0 }]
        );
        assert_eq!(diagram.essential_count(), 0);
    }
}
