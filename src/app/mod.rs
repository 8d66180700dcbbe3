//! Application core: certification workflow logic, zero I/O.
//!
//! This module contains the orchestration rules: run one test at a time,
//! classify the pod's answer, gate certification on every test passing.
//! All interaction with the messaging gateway, timers and operator surfaces
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without a network.

pub mod commands;
pub mod events;
pub mod poll;
pub mod ports;
pub mod service;
