//! `ev-spatial`: road graph, route planning, and signal-on-route resolution.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`network`]  | `RoadGraph` (CSR + R-tree), `RoadGraphBuilder`               |
//! | [`planner`]  | `RoutePlanner` trait, `Path`, `AStarPlanner`, `DijkstraPlanner` |
//! | [`mission`]  | `MissionPlan`: station → patient → hospital → station legs  |
//! | [`resolver`] | `SignalOnRouteResolver`, `SignalSite`, `SignalOnRoute`       |
//! | [`registry`] | `SignalRegistry`, `RoutingProvider`, `GraphRoutingProvider`  |
//! | [`loader`]   | `load_graph_csv`, `load_graph_reader`                        |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag        | Effect                                                   |
//! |-------------|----------------------------------------------------------|
//! | `serialize` | Derives `Serialize`/`Deserialize` on public types.       |

pub mod error;
pub mod loader;
pub mod mission;
pub mod network;
pub mod planner;
pub mod registry;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use loader::{load_graph_csv, load_graph_reader};
pub use mission::{Leg, MissionPlan};
pub use network::{RoadGraph, RoadGraphBuilder};
pub use planner::{AStarPlanner, DijkstraPlanner, Path, RoutePlanner};
pub use registry::{GraphRoutingProvider, RoutingProvider, SignalRegistry};
pub use resolver::{SignalOnRoute, SignalOnRouteResolver, SignalSite, SignalsOnRoute};
