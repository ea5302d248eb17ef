//! Languages command implementation.

use crate::cli::Output;
use crate::language::supported_languages;

/// Run the languages command.
pub fn run_languages() {
    Output::header("Supported languages");
    for language in supported_languages() {
        Output::kv(language.code, language.name);
    }
}
