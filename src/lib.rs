//! Fitplan - nutrition targets and weekly meal/workout plans from a
//! biometric profile.
//!
//! # Overview
//!
//! A validated profile (age, height, weight, gender, activity level, goal)
//! yields calorie and macronutrient targets from closed-form formulas. On top
//! of those, a generative text model is asked for a 7-day meal and workout
//! plan; its output is parsed defensively, retried once, and replaced by an
//! error-flagged empty plan (or, on request, a template plan) when unusable.
//!
//! # Modules
//!
//! - [`model`]: Profiles, macro results, plans and request/response types
//! - [`validation`]: Profile normalization and range checks
//! - [`nutrition`]: BMR, TDEE, calorie and macro calculation
//! - [`templates`]: Deterministic template and portion plans
//! - [`generator`]: Text generation seam and completion-server client
//! - [`extraction`]: Sentinel-delimited JSON extraction from model output
//! - [`orchestrator`]: Prompt, retry and fallback state machine
//! - [`request_log`]: Best-effort audit log of generation requests
//! - [`storage`]: SQLite storage layer
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod extraction;
pub mod generator;
pub mod model;
pub mod nutrition;
pub mod orchestrator;
pub mod request_log;
pub mod storage;
pub mod templates;
pub mod validation;
