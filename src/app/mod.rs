//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the charging station: the
//! control-document model, the reconciliation engine, the flame alarm, and
//! the per-cycle orchestration in [`service`].  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod alarm;
pub mod document;
pub mod events;
pub mod ports;
pub mod reconcile;
pub mod service;
