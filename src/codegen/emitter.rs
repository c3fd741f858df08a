//! Keyed section accumulator and program layout.
//!
//! ```text
//!   translators ──contribute(section, key, fragment)──►  TargetEmitter
//!                                                          │
//!     Headers      [ (key, fragment), ... ]   insertion    │
//!     Definitions  [ ... ]                    ordered,     │ render()
//!     Setup        [ ... ]                    last write   ▼
//!     Loop         [ ... ]                    wins       source text
//!     Functions    [ ... ]
//! ```
//!
//! Contributing a key that is already present replaces the fragment but
//! keeps its original position, so emitting the same block twice yields
//! one declaration and a stable layout.  Script bodies are appended after
//! the keyed setup / loop fragments.

use super::Target;
use super::block::Stage;
use super::fragment::{self, CppFunction, INDENT};

/// The five keyed output sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Headers,
    Definitions,
    Setup,
    Loop,
    Functions,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Headers,
        Section::Definitions,
        Section::Setup,
        Section::Loop,
        Section::Functions,
    ];

    fn index(self) -> usize {
        match self {
            Self::Headers => 0,
            Self::Definitions => 1,
            Self::Setup => 2,
            Self::Loop => 3,
            Self::Functions => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KeyedSection {
    entries: Vec<(String, String)>,
}

impl KeyedSection {
    fn upsert(&mut self, key: String, fragment: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = fragment,
            None => self.entries.push((key, fragment)),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn fragments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }
}

/// Per-target source accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEmitter {
    target: Target,
    sections: [KeyedSection; 5],
    setup_body: Vec<String>,
    loop_body: Vec<String>,
}

impl TargetEmitter {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            sections: Default::default(),
            setup_body: Vec::new(),
            loop_body: Vec::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Insert or replace the fragment stored under `key` in `section`.
    pub fn contribute(&mut self, section: Section, key: impl Into<String>, fragment: impl Into<String>) {
        self.sections[section.index()].upsert(key.into(), fragment.into());
    }

    pub fn fragment(&self, section: Section, key: &str) -> Option<&str> {
        self.sections[section.index()].get(key)
    }

    /// Keys of `section` in insertion order.
    pub fn keys(&self, section: Section) -> impl Iterator<Item = &str> {
        self.sections[section.index()]
            .entries
            .iter()
            .map(|(k, _)| k.as_str())
    }

    /// Append a script statement to the setup or loop body.  Empty
    /// statements (hats, failed blocks) are dropped.
    pub fn push_statement(&mut self, stage: Stage, code: &str) {
        let code = fragment::statement(self.target, code);
        if code.is_empty() {
            return;
        }
        match stage {
            Stage::Setup => self.setup_body.push(code),
            Stage::Loop => self.loop_body.push(code),
        }
    }

    /// Lay the sections out as complete source text.
    pub fn render(&self) -> String {
        match self.target {
            Target::Arduino => self.render_arduino(),
            Target::MicroPython => self.render_micropython(),
        }
    }

    fn section(&self, section: Section) -> impl Iterator<Item = &str> {
        self.sections[section.index()].fragments()
    }

    fn stage_lines(&self, section: Section, body: &[String]) -> Vec<String> {
        self.section(section)
            .map(str::to_string)
            .chain(body.iter().cloned())
            .collect()
    }

    // ── Arduino ──────────────────────────────────────────────────

    fn render_arduino(&self) -> String {
        let mut out = String::new();
        push_block(&mut out, self.section(Section::Headers));
        push_block(&mut out, self.section(Section::Definitions));

        let setup = CppFunction::new("void", "setup")
            .body(self.stage_lines(Section::Setup, &self.setup_body));
        let lp = CppFunction::new("void", "loop")
            .body(self.stage_lines(Section::Loop, &self.loop_body));
        out.push_str(&setup.to_string());
        out.push('\n');
        out.push_str(&lp.to_string());

        for f in self.section(Section::Functions) {
            out.push('\n');
            out.push_str(f.trim_end());
            out.push('\n');
        }
        out
    }

    // ── MicroPython ──────────────────────────────────────────────

    fn render_micropython(&self) -> String {
        let mut out = String::new();
        push_block(&mut out, self.section(Section::Headers));
        push_block(&mut out, self.section(Section::Definitions));

        // Routines must exist before top-level setup code references them.
        for f in self.section(Section::Functions) {
            out.push_str(f.trim_end());
            out.push_str("\n\n");
        }

        let setup = self.stage_lines(Section::Setup, &self.setup_body);
        push_block(&mut out, setup.iter().map(String::as_str));

        let lp = self.stage_lines(Section::Loop, &self.loop_body);
        if !lp.is_empty() {
            out.push_str("while True:\n");
            for line in &lp {
                out.push_str(&fragment::indent(line, INDENT));
                out.push('\n');
            }
        }
        out
    }
}

/// Each fragment on its own line, then one blank line.  Nothing if empty.
fn push_block<'a>(out: &mut String, fragments: impl Iterator<Item = &'a str>) {
    let mut any = false;
    for f in fragments {
        out.push_str(f.trim_end());
        out.push('\n');
        any = true;
    }
    if any {
        out.push('\n');
    }
}
