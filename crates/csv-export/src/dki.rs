//! Scanner for Dynamic Keyword Insertion macros (`{KeyWord:Default Text}`).

/// Structural brace defect. At most one is reported per text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceProblem {
    /// A `{` without a matching `}` or a stray `}`.
    Unbalanced,
    /// A `{` opened while another macro is still open.
    Nested,
}

/// One `{...}` macro found in a piece of ad copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionMacro {
    /// Text before the colon, e.g. `KeyWord`.
    pub name: String,
    /// Text after the colon; `None` when there is no colon at all.
    pub default_text: Option<String>,
}

impl InsertionMacro {
    pub fn is_keyword(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case("keyword")
    }

    /// True when a non-blank default follows the colon.
    pub fn has_default(&self) -> bool {
        self.default_text
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkiScan {
    pub macros: Vec<InsertionMacro>,
    /// Characters outside any macro. This is what counts toward length limits.
    pub literal_chars: usize,
    pub problem: Option<BraceProblem>,
}

pub fn scan(text: &str) -> DkiScan {
    let mut macros = Vec::new();
    let mut literal_chars = 0;
    let mut problem = None;
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '{' => {
                if depth > 0 && problem.is_none() {
                    problem = Some(BraceProblem::Nested);
                }
                depth += 1;
                if depth == 1 {
                    current.clear();
                }
            }
            '}' => {
                if depth == 0 {
                    problem = Some(BraceProblem::Unbalanced);
                    literal_chars += 1;
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    macros.push(parse_macro(&current));
                }
            }
            _ if depth > 0 => current.push(ch),
            _ => literal_chars += 1,
        }
    }

    if depth > 0 {
        problem = Some(BraceProblem::Unbalanced);
        // An unterminated macro is literal text as far as length goes.
        literal_chars += current.chars().count() + depth;
    }

    DkiScan {
        macros,
        literal_chars,
        problem,
    }
}

/// Case-insensitive check for an opening `{KeyWord:` in the text, balanced
/// or not.
pub fn contains_keyword_macro(text: &str) -> bool {
    text.to_ascii_lowercase().contains("{keyword:")
}

fn parse_macro(body: &str) -> InsertionMacro {
    match body.split_once(':') {
        Some((name, default)) => InsertionMacro {
            name: name.to_string(),
            default_text: Some(default.to_string()),
        },
        None => InsertionMacro {
            name: body.to_string(),
            default_text: None,
        },
    }
}
