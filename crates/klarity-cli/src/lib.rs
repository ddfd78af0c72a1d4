//! Command-line front end for the Klarity template factory.
//!
//! The `klarity` binary edits a JSON template draft and turns it into a
//! `.docx` template:
//!
//! ```sh
//! klarity init
//! klarity add-section --title "Current Systems" --format table \
//!   --goal "Tabulate every system the client uses today."
//! klarity prompt --section 2      # review what will be sent
//! OPENAI_API_KEY=sk-... klarity generate --output-dir out/
//! ```

pub mod config;
pub mod draft_file;
pub mod report;

pub use config::{API_KEY_ENV, DEFAULT_DRAFT_PATH, FactoryConfig};
pub use draft_file::{load_draft, position_to_index, save_draft};
pub use report::{FailureReport, ProgressHandler, failure_report, unexpected_failure};
