/// cli/src/output.rs
/// Output utilities for the glint CLI
/// description: styled status lines and the instruction-count table
/// printed by `glint lower --stats`.

use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::Style;
use glint_core::Shader;
use glint_core::ir::{CfNode, InstrKind};

/// Styles for the different kinds of status line.
pub struct FormatStyle {
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            info: Style::new().cyan(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
        }
    }
}

/// Writes styled one-line status messages into any `Write`.
pub struct StatusPrinter<T: Write> {
    out: T,
    formatting: FormatStyle,
}

impl<T: Write> StatusPrinter<T> {
    pub fn new(out: T) -> Self {
        StatusPrinter { out, formatting: FormatStyle::default() }
    }

    fn line(&mut self, tag: &str, text: &str, style: &Style) -> io::Result<()> {
        writeln!(self.out, "{} {}", style.apply_to(tag), text)
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.info.clone();
        self.line("info:", text, &style)
    }

    pub fn warning(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.warning.clone();
        self.line("warning:", text, &style)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.error.clone();
        self.line("error:", text, &style)
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.success.clone();
        self.line("done:", text, &style)
    }
}

/// Per-function instruction counts, by instruction family.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstrCounts {
    pub alu: usize,
    pub intrinsic: usize,
    pub tex: usize,
    pub call: usize,
    pub jump: usize,
    pub other: usize,
    pub ifs: usize,
    pub loops: usize,
}

impl InstrCounts {
    pub fn total(&self) -> usize {
        self.alu + self.intrinsic + self.tex + self.call + self.jump + self.other
    }

    fn tally(&mut self, shader: &Shader, body: &[CfNode]) {
        for node in body {
            match node {
                CfNode::Instr(id) => match shader.instr(*id).kind {
                    InstrKind::Alu { .. } => self.alu += 1,
                    InstrKind::Intrinsic { .. } => self.intrinsic += 1,
                    InstrKind::Tex(_) => self.tex += 1,
                    InstrKind::Call { .. } => self.call += 1,
                    InstrKind::Jump(_) => self.jump += 1,
                    InstrKind::Undef | InstrKind::LoadConst { .. } => self.other += 1,
                },
                CfNode::If { then_body, else_body, .. } => {
                    self.ifs += 1;
                    self.tally(shader, then_body);
                    self.tally(shader, else_body);
                }
                CfNode::Loop { body } => {
                    self.loops += 1;
                    self.tally(shader, body);
                }
            }
        }
    }
}

/// Counts for every implemented function, in declaration order.
pub fn count_instructions(shader: &Shader) -> Vec<(String, InstrCounts)> {
    shader
        .functions
        .iter()
        .filter_map(|func| {
            let imp = func.impl_.as_ref()?;
            let mut counts = InstrCounts::default();
            counts.tally(shader, &imp.body);
            Some((func.name.clone(), counts))
        })
        .collect()
}

/// Render the `--stats` table.
pub fn stats_table(shader: &Shader) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["function", "alu", "intrinsic", "tex", "call", "jump", "other", "if", "loop", "total"]);

    for (name, c) in count_instructions(shader) {
        table.add_row(vec![
            name,
            c.alu.to_string(),
            c.intrinsic.to_string(),
            c.tex.to_string(),
            c.call.to_string(),
            c.jump.to_string(),
            c.other.to_string(),
            c.ifs.to_string(),
            c.loops.to_string(),
            c.total().to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_carry_their_tag() {
        let mut buf = Vec::new();
        {
            let mut printer = StatusPrinter::new(&mut buf);
            printer.error("no such file").unwrap();
            printer.success("lowered 2 functions").unwrap();
        }
        let text = console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string();
        assert!(text.contains("error: no such file"));
        assert!(text.contains("done: lowered 2 functions"));
    }
}
