use itertools::Itertools;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn callback(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self { label: label.into(), action: action.into() }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: Vec<Button>) -> &mut Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    pub fn find(&self, action: &str) -> Option<&Button> {
        self.rows.iter().flatten().find(|b| b.action == action)
    }
}

impl From<Vec<Vec<Button>>> for Keyboard {
    fn from(rows: Vec<Vec<Button>>) -> Self {
        let mut keyboard = Keyboard::new();
        for row in rows {
            keyboard.add_row(row);
        }
        keyboard
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Keyboard,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub text: String,
    pub alert: bool,
}

impl Notice {
    pub fn toast(text: impl Into<String>) -> Self {
        Self { text: text.into(), alert: false }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self { text: text.into(), alert: true }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Caption {
    Join,
    Quit,
    Kick,
    Start,
    Restart,
    Draw,
    Surrender,
}

/// Resolves display labels. Board cells come in as single-character codes.
pub trait Labels: Send + Sync {
    fn cell(&self, code: char) -> String;
    fn caption(&self, caption: Caption) -> String;
}

pub struct DefaultLabels;

impl Labels for DefaultLabels {
    fn cell(&self, code: char) -> String {
        match code {
            'x' => "⚫",
            'o' => "⚪",
            'X' => "♚",
            'O' => "♔",
            '*' => "🔘",
            '+' => "·",
            _ => " ",
        }.to_owned()
    }

    fn caption(&self, caption: Caption) -> String {
        match caption {
            Caption::Join => "Join",
            Caption::Quit => "Quit",
            Caption::Kick => "Kick",
            Caption::Start => "Start",
            Caption::Restart => "Play again",
            Caption::Draw => "🤝 Draw",
            Caption::Surrender => "🏳 Surrender",
        }.to_owned()
    }
}

/// Builds an action token: `"<code>;<verb>[;<payload>]"`.
pub fn token(code: &str, verb: &str, payload: Option<&str>) -> String {
    match payload {
        Some(payload) => format!("{};{};{}", code, verb, payload),
        None => format!("{};{}", code, verb),
    }
}

pub fn caption_button(labels: &dyn Labels, caption: Caption, code: &str, verb: &str) -> Button {
    Button::callback(labels.caption(caption), token(code, verb, None))
}

pub fn lines<'a>(parts: impl IntoIterator<Item=&'a str>) -> String {
    parts.into_iter().filter(|s| !s.is_empty()).join("\n")
}
