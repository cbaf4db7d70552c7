use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Status {
    Ok,
    Warn,
}

impl Status {
    fn badge(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
        }
    }

    fn color(self) -> AnsiColor {
        match self {
            Self::Ok => AnsiColor::Green,
            Self::Warn => AnsiColor::Yellow,
        }
    }
}

/// Line-oriented output for commands; plain when piped or `NO_COLOR` is set.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        let plain = std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal();
        Self::from_style(if plain {
            OutputStyle::Plain
        } else {
            OutputStyle::Rich
        })
    }

    pub(crate) fn print_status(self, status: Status, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        println!("{}", render_section_header(self.style, title));
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: Status, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let badge = Style::new().fg_color(Some(status.color().into()));
            format!("{} {message}", paint(badge, status.badge()))
        }
    }
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> String {
    let header = format!("==> {title}");
    match style {
        OutputStyle::Plain => header,
        OutputStyle::Rich => paint(
            Style::new()
                .fg_color(Some(AnsiColor::BrightBlue.into()))
                .effects(Effects::BOLD),
            &header,
        ),
    }
}

fn paint(style: Style, text: &str) -> String {
    format!("{}{text}{}", style.render(), style.render_reset())
}
