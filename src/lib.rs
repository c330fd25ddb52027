//! PawCare - AI Behavior Analysis for Pets
//!
//! Turns an owner's description of a pet behavior (plus optional context and
//! photo) into a plain-text veterinary behavior analysis. Requests run through
//! a fixed fallback chain over a text-only and a multimodal provider; results
//! can be saved per pet in an owner-scoped document store.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pawcare::{AnalysisRequest, BehaviorAnalyzer, Config, SubjectProfile};
//!
//! let config = Config::default();
//! let analyzer = BehaviorAnalyzer::from_config(&config.openai, &config.gemini)?;
//! let request = AnalysisRequest::new(SubjectProfile::new("Dog"), "Barks at the door")
//!     .with_context("Only when the mail arrives");
//! let result = analyzer.analyze(&request).await?;
//! println!("{}", result.text);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: Prompt builder, provider adapters, normalization, fallback controller
//! - [`behavior`]: Pet registry and saved analyses
//! - [`catalog`]: Vaccine and activity catalogs per species
//! - [`storage`]: Document store (SQLite) and blob store
//! - [`config`]: Layered configuration

pub mod ai;
pub mod behavior;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{PawError, ProviderError, ProviderErrorKind, Result, ResultExt};

// Domain
pub use types::{AnalysisRequest, AnalysisResult, ImageAttachment, Pet, Session, SubjectProfile};

// Storage
pub use storage::{Database, DocumentStore, SharedDatabase, SqliteDocumentStore};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{BehaviorAnalyzer, LlmProvider, LlmResponse, ProviderConfig, normalize_response};

// =============================================================================
// Behavior Re-exports
// =============================================================================

pub use behavior::{BehaviorJournal, PetRegistry};
