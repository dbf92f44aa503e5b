//! Topologyx core library: density filtrations, ToMaTo clustering and
//! level-set persistence of signals.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod datasource;
mod density;
mod distance;
mod error;
mod filtration;
mod generator;
mod neighbors;
mod persistence;
mod quality;
mod result;
mod signal;
#[cfg(test)]
mod test_utils;
mod tomato;
mod union_find;

pub use crate::{
    builder::{DEFAULT_N_NEIGHBORS, DEFAULT_TAU, Tomato, TomatoBuilder},
    datasource::{DataSource, PointCloud},
    density::{Bandwidth, DensityEstimator, DistanceToMeasure, GaussianKde},
    distance::{DistanceError, VectorKind, euclidean_distance},
    error::{
        DataSourceError, DataSourceErrorCode, DensityError, DensityErrorCode, GeneratorError,
        GeneratorErrorCode, Result, SignalError, SignalErrorCode, TomatoError, TomatoErrorCode,
    },
    filtration::{FiltrationEdge, ModeFiltration},
    generator::{ClusterGenerator, ClusterStructure, LabelledPoints},
    neighbors::{BruteForceIndex, NeighborIndex, RankedNeighbors},
    persistence::{PersistenceDiagram, PersistenceInterval},
    quality::{
        ClusteringQualityError, ClusteringQualityScore, adjusted_rand_index,
        clustering_quality_score, normalized_mutual_information,
    },
    result::{ClusterId, ClusterLayoutError, ClusteringResult},
    signal::{Levels, time_delay_embedding},
    tomato::{TomatoClustering, define_clusters},
    union_find::UnionFind,
};
