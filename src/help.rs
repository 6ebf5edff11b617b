use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::io::Write;
use terminal_size::{terminal_size, Width};
use textwrap::{self, wrap};

use crate::style::{self, ColorChoice, StyleSheet};

const NAME: &str = "rowset";

enum HelpItem<'a> {
    Usage(&'a str),
    Paragraph(&'a str),
    Section(Section<'a>),
}
struct Section<'a> {
    title: &'a str,
    entries: Vec<Entry<'a>>,
}
struct Entry<'a> {
    item: &'a str,
    caption: &'a str,
}

pub(crate) fn version() -> String {
    format!("{NAME} {}", std::env!("CARGO_PKG_VERSION"))
}

pub(crate) fn print(color: ColorChoice) -> Result<()> {
    let style = style::colored(color);
    let mut stdout = std::io::stdout().lock();
    render(&mut stdout, style).context("can't print the help message")
}

fn render(out: &mut dyn Write, style: &StyleSheet) -> std::io::Result<()> {
    let help = parse(include_str!("help.txt"));
    writeln!(out, "{} {}", style.app_name(NAME), std::env!("CARGO_PKG_VERSION"))?;
    for help_item in help {
        match help_item {
            HelpItem::Paragraph(text) => {
                for line in wrap(text, &C.wrap_options) {
                    writeln!(out, "{line}")?;
                }
            }
            HelpItem::Usage(args) => {
                writeln!(out, "{}{}{args}", style.title("Usage: "), style.app_name(NAME))?;
            }
            HelpItem::Section(s) => s.print(out, style)?,
        }
    }
    Ok(())
}

fn parse(text: &str) -> Vec<HelpItem> {
    let mut help = Vec::new();
    let mut lines = text.lines().fuse();
    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix("Usage: ") {
            let args = rest.find(' ').map_or("", |space| &rest[space..]);
            help.push(HelpItem::Usage(args));
        } else if line.ends_with(':') {
            let (entries, after) = entries_of(&mut lines);
            help.push(HelpItem::Section(Section { title: line, entries }));
            help.extend(after);
        } else {
            help.push(HelpItem::Paragraph(line));
        }
    }
    help
}

// Collects a section's entries up to a blank line or the end of the text.
// The blank line, if any, comes back as an empty paragraph so the gap
// before the next part of the message survives.
fn entries_of<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
) -> (Vec<Entry<'a>>, Option<HelpItem<'a>>) {
    let mut entries = Vec::new();
    for entry in lines {
        let entry = entry.trim_end();
        if entry.is_empty() {
            return (entries, Some(HelpItem::Paragraph("")));
        }
        let Some(gap) = entry.rfind("  ") else { panic!("no caption separator in {entry:?}") };
        let (item, caption) = entry.split_at(gap + 2);
        entries.push(Entry { item, caption });
    }
    (entries, None)
}

impl<'a> Section<'a> {
    fn print(&self, out: &mut dyn Write, style: &StyleSheet) -> std::io::Result<()> {
        writeln!(out, "{}", style.title(self.title))?;
        let fits_in_line = self.entries.iter().all(Entry::fits_in_line);
        let chosen = if fits_in_line {
            self.same_line_help_lines()
        } else {
            let same_line = self.same_line_help_lines();
            let next_line = self.next_line_help_lines();
            if badness(&same_line) <= badness(&next_line) {
                same_line
            } else {
                next_line
            }
        };
        // Each entry's first line opens with the entry's raw item text; the
        // item gets its styling here, where the line is finally written.
        for (entry, lines) in self.entries.iter().zip(&chosen) {
            let mut lines = lines.iter();
            if let Some(first) = lines.next() {
                match first.strip_prefix(entry.item) {
                    Some(rest) => writeln!(out, "{}{rest}", style.item(entry.item))?,
                    None => writeln!(out, "{first}")?,
                }
            }
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        Ok(())
    }
    fn next_line_help_indent(&self) -> &'static str {
        let deepest = self.entries.iter().map(|e| indentation_of(e.item)).max().unwrap_or(0);
        &BLANKS[..(deepest + 4).min(BLANKS.len())]
    }
    fn next_line_help_lines(&self) -> Vec<Vec<Cow<'a, str>>> {
        let indent = self.next_line_help_indent();
        self.entries.iter().map(|entry| entry.next_line_help(indent)).collect()
    }
    fn same_line_help_lines(&self) -> Vec<Vec<Cow<'a, str>>> {
        self.entries.iter().map(Entry::same_line_help).collect()
    }
}

// An entry shown in n lines costs n, plus 2 for each line past its second.
fn badness<T>(vv: &[Vec<T>]) -> usize {
    vv.iter().fold(0, |total, v| {
        let m = v.len().saturating_sub(2);
        total + v.len() + m * 2
    })
}

fn indentation_of(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

const BLANKS: &str = "                                                        ";
impl<'a> Entry<'a> {
    fn fits_in_line(&self) -> bool {
        self.item.len() + self.caption.len() <= C.line_width
    }
    fn next_line_help(&self, indent: &'a str) -> Vec<Cow<'a, str>> {
        let mut lines = vec![Cow::from(self.item)];
        let options = C.wrap_options.clone().initial_indent(indent).subsequent_indent(indent);
        lines.extend(wrap(self.caption, options));
        lines
    }
    fn same_line_help(&self) -> Vec<Cow<'a, str>> {
        let hang = &BLANKS[..(self.item.len() + 4).min(BLANKS.len())];
        let options = C.wrap_options.clone().initial_indent(self.item).subsequent_indent(hang);
        wrap(self.caption, options)
    }
}

struct Constants<'a> {
    line_width: usize,
    wrap_options: textwrap::Options<'a>,
}
static C: Lazy<Constants> = Lazy::new(|| {
    fn from_env() -> Option<usize> {
        std::env::var("COLUMNS").ok()?.parse().ok()
    }
    let line_width = terminal_size()
        .map_or_else(|| from_env().unwrap_or(100), |(Width(w), _)| usize::from(w));
    Constants { line_width, wrap_options: textwrap::Options::new(line_width) }
});
