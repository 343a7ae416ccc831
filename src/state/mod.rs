/// State management module
///
/// This module handles all application state, including:
/// - The pair data model (data.rs)
/// - The open folder, its pairs and the selection (session.rs)
/// - The remembered folder between launches (preferences.rs)

pub mod data;
pub mod preferences;
pub mod session;
