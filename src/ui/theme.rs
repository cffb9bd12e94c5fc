//! Output styles
//!
//! stdout and stderr are themed separately. Each stream is coloured only when
//! it is a terminal that supports colour.

use console::Term;
use owo_colors::Style;
use std::sync::OnceLock;

static STDOUT: OnceLock<Theme> = OnceLock::new();
static STDERR: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    /// Section and command headings
    pub heading: Style,
    pub ok: Style,
    pub failure: Style,
    pub caution: Style,
    /// Left-hand side of `label: value` lines
    pub label: Style,
    /// Content URIs wherever they are echoed
    pub uri: Style,
    /// Bell marker on delivered change events
    pub change: Style,
    pub dim: Style,
}

impl Theme {
    pub fn for_term(term: &Term) -> Self {
        if term.is_term() && term.features().colors_supported() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
            uri: Style::new().blue().underline(),
            change: Style::new().magenta().bold(),
            dim: Style::new().bright_black(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            heading: none.clone(),
            ok: none.clone(),
            failure: none.clone(),
            caution: none.clone(),
            label: none.clone(),
            uri: none.clone(),
            change: none.clone(),
            dim: none,
        }
    }
}

/// Theme for lines written to stdout
pub fn theme() -> &'static Theme {
    STDOUT.get_or_init(|| Theme::for_term(&Term::stdout()))
}

/// Theme for lines written to stderr
pub fn err_theme() -> &'static Theme {
    STDERR.get_or_init(|| Theme::for_term(&Term::stderr()))
}
