//! ANSI styling for the help message. `colored` hands back one of three
//! fixed sheets; the auto sheet turns itself off when standard output is
//! not a color terminal.
use once_cell::sync::Lazy;

/// What `--color` asked for.
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

// One SGR code, applied by bracketing the text with the code and a reset.
// An empty code leaves the text alone.
#[derive(Debug, Clone, Copy)]
struct Paint(&'static str);

impl Paint {
    const NONE: Paint = Paint("");
    fn over(self, text: &str) -> String {
        if self.0.is_empty() {
            text.to_string()
        } else {
            format!("\x1B[{}m{text}\x1B[m", self.0)
        }
    }
}

/// The paints the help message is written with.
#[derive(Debug, Clone, Copy)]
pub struct StyleSheet {
    app: Paint,
    item: Paint,
    title: Paint,
}

impl StyleSheet {
    pub fn app_name(&self, text: &str) -> String {
        self.app.over(text)
    }
    pub fn item(&self, text: &str) -> String {
        self.item.over(text)
    }
    pub fn title(&self, text: &str) -> String {
        self.title.over(text)
    }
}

const COLORED: StyleSheet =
    StyleSheet { app: Paint("32;1"), item: Paint("32"), title: Paint("33") };
const PLAIN: StyleSheet = StyleSheet { app: Paint::NONE, item: Paint::NONE, title: Paint::NONE };

static DETECTED: Lazy<StyleSheet> = Lazy::new(|| {
    use enable_ansi_support::enable_ansi_support;
    use supports_color::Stream;
    if enable_ansi_support().is_ok() && supports_color::on(Stream::Stdout).is_some() {
        COLORED
    } else {
        PLAIN
    }
});

pub fn colored(choice: ColorChoice) -> &'static StyleSheet {
    match choice {
        ColorChoice::Always => &COLORED,
        ColorChoice::Never => &PLAIN,
        ColorChoice::Auto => Lazy::force(&DETECTED),
    }
}
