//! Syntax highlighting collaborator.
//!
//! The runner never renders source itself; it notifies a highlighter after
//! every mutation of the source buffer. Running without one is fine.

use crate::language::Language;

pub trait Highlighter {
    fn highlight(&self, language: Language, source: &str);
}

impl<F> Highlighter for F
where
    F: Fn(Language, &str),
{
    fn highlight(&self, language: Language, source: &str) {
        self(language, source)
    }
}
