//! # bdd-logic: decision diagrams for logic synthesis
//!
//! **`bdd-logic`** is a manager-centric library of canonical Binary Decision
//! Diagrams with complement edges, together with the cube-set (cover)
//! algebra that two-level and multi-level logic synthesis is built on.
//!
//! ## Key Features
//!
//! - **One node store, two diagram families**: Boolean functions ([`Ref`][crate::reference::Ref])
//!   and zero-suppressed covers ([`Cover`][crate::cover::Cover]) share the [`Bdd`][crate::bdd::Bdd]
//!   manager, its reference counts and its garbage collector.
//! - **Reordering-safe operations**: every public operation restarts transparently
//!   when dynamic reordering changes the variable order underneath it.
//! - **Bounded operations**: AND/OR/difference and ISOP accept a deadline and a node
//!   budget ([`Limits`][crate::limits::Limits]) and abort cleanly when either is hit.
//! - **Cover algebra**: three-way decomposition, product, primes, supercubes,
//!   subsumption filters and irredundant sum-of-products extraction.
//! - **Distance-1 decomposition**, per-level **profiles**, variable **permutation**
//!   and **transfer** between managers.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_logic::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let a = bdd.mk_var(1);
//! let b = bdd.mk_var(2);
//! let c = bdd.mk_var(3);
//!
//! // Majority of three.
//! let ab = bdd.apply_and(a, b).unwrap();
//! let ac = bdd.apply_and(a, c).unwrap();
//! let bc = bdd.apply_and(b, c).unwrap();
//! let maj = bdd.apply_or_many([ab, ac, bc]).unwrap();
//!
//! // Its irredundant cover: ab + ac + bc.
//! let cover = bdd.isop_cover(maj, maj).unwrap();
//! assert_eq!(bdd.cubes(cover).count(), 3);
//! ```
//!
//! ## Reference counting
//!
//! Results of public operations are returned with one reference owned by the
//! caller. Give it back with [`Bdd::release`][crate::bdd::Bdd::release], or
//! scope it with [`Bdd::hold`][crate::bdd::Bdd::hold]. Unreleased results are
//! simply never collected.
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the manager, node allocation, reference counting and collection.
//! - **[`ops`]** and **[`bounded`]**: Boolean operations, unbounded and bounded.
//! - **[`cover`]** and **[`isop`]**: the cube-set layer.
//! - **[`reorder`]**: adjacent swaps and sifting.
//! - **[`distance`]**, **[`profile`]**, **[`permute`]**, **[`transfer`]**.

pub mod bdd;
pub mod bounded;
pub mod cache;
pub mod cover;
pub mod debug;
pub mod distance;
pub mod error;
pub mod guard;
pub mod isop;
pub mod limits;
pub mod node;
pub mod ops;
pub mod paths;
pub mod permute;
pub mod profile;
pub mod reference;
pub mod reorder;
pub mod sat;
pub mod subtable;
pub mod transfer;
pub mod types;
pub mod utils;

pub use bdd::{Bdd, BddConfig, BddStats};
pub use cover::{Cover, CoverParts};
pub use error::{AbortReason, DdError, DdResult};
pub use guard::{Held, HeldList};
pub use limits::Limits;
pub use reference::Ref;
pub use types::{Level, Lit, Var};
