//! The core of a province setup editor for Imperator: Rome.
//!
//! ## Getting Started
//!
//! The facade for the loaded game files is [game_data::ProvinceSetup], which
//! is built from [settings::Settings] through [game_data::ProvinceSetup::load],
//! or step by step with a [game_data::SetupLoader]. Changes are collected in a
//! [session::EditSession] and written back with [serializer::write_changed],
//! which regenerates only the setup files holding an edited province.
//!
//! ## Example
//!
//! ```no_run
//! use imperator_setup_editor::{
//!     game_data::ProvinceSetup, serializer::write_changed, session::EditSession,
//!     settings::Settings,
//! };
//!
//! let settings = Settings::load("settings.json").unwrap();
//! let setup = ProvinceSetup::load(&settings, false).unwrap();
//! let mut session = EditSession::new();
//! if let Some(mut record) = setup.record_for(12) {
//!     record.civilization_value = 30;
//!     session.mark_edited(12, record);
//! }
//! session.set_name(12, "Neapolis");
//! write_changed(&setup, &session, &settings.output_path).unwrap();
//! ```

/// A submodule that provides opaque types commonly used in the project
pub mod types;

/// The editor configuration, read from `settings.json`
pub mod settings;

/// A submodule that handles setup file parsing
pub mod parser;

/// The structured province records, as the editor sees them
pub mod structures;

/// A submodule for handling the game files: setup scripts, the color table,
/// the province map and the province names
pub mod game_data;

/// The pending changes of an editing session
pub mod session;

/// Rendering and writing of regenerated files
pub mod serializer;
