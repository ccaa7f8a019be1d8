//! # diagnet
//!
//! A diagnostic inference engine over typed semantic networks.
//!
//! Observed feature values activate features; activation propagates through
//! AND/OR gates to hypotheses; contradicted or unsupported hypotheses are
//! removed; the survivors are returned with the features that argue for
//! them.
//!
//! ## Architecture
//!
//! - **Conditions** (`condition`): range, set, and exact-match predicates on observed values
//! - **Semantic network** (`network`): petgraph arena of features, gates, and hypotheses
//! - **Solver** (`solve`): seeding, fixed-point propagation, reduction, refinement
//! - **Knowledge bases** (`kb`): TOML definitions assembled into networks
//! - **Engine** (`engine`): catalog, access control, and the request API
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use diagnet::engine::{Engine, EngineConfig};
//! use diagnet::network::NodeId;
//! use diagnet::solve::{Request, UserId};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let kb = engine.load_file(Path::new("respiratory.toml")).unwrap();
//! let request = Request::new(UserId(7), kb)
//!     .observe(NodeId::new(10).unwrap(), "39")
//!     .with_differentiation();
//! let answer = engine.solve(&request).unwrap();
//! for name in answer.hypothesis_names() {
//!     println!("{name}");
//! }
//! ```

pub mod answer;
pub mod condition;
pub mod engine;
pub mod error;
pub mod kb;
pub mod network;
pub mod solve;
