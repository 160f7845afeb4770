use jomini::{
    text::{Operator, ReaderError, Token, TokenReader},
    Scalar,
};

/// A single statement of a province block.
///
/// The game files keep one statement per line, but nothing stops a modder
/// from writing `1={ a=b c={ d=e } }` on a single line, so the token stream
/// is grouped into statements before the record parser ever looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `key=value`, the value without its quotes and with escapes kept as is
    Pair(String, String),
    /// `key={`
    Open(String),
    /// `}`
    Close,
    /// Anything else, like an array element or a lonely `{`
    Other(String),
}

/// A statement together with its position within the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Position counter. One per physical line, or one per statement on lines
    /// holding more than a single statement.
    pub position: usize,
    pub statement: Statement,
}

fn scalar_string(scalar: Scalar<'_>) -> String {
    String::from_utf8_lossy(scalar.as_bytes()).into_owned()
}

/// Collects statements and hands out their positions
struct Grouper {
    lines: Vec<Line>,
    position: usize,
    last_line: Option<usize>,
    /// A scalar waiting for its operator or value, with its physical line
    key: Option<(String, usize)>,
    past_eq: bool,
}

impl Grouper {
    fn new() -> Self {
        Grouper {
            lines: Vec::new(),
            position: 0,
            last_line: None,
            key: None,
            past_eq: false,
        }
    }

    fn push(&mut self, line: usize, statement: Statement) {
        self.position = match self.last_line {
            Some(last) if last == line => self.position + 1,
            Some(last) => self.position + (line - last),
            None => line,
        };
        self.last_line = Some(line);
        self.lines.push(Line {
            position: self.position,
            statement,
        });
    }

    /// Emits the pending key, `key=` with nothing after it is an empty pair
    fn flush(&mut self) {
        if let Some((key, line)) = self.key.take() {
            if self.past_eq {
                self.push(line, Statement::Pair(key, String::new()));
            } else {
                self.push(line, Statement::Other(key));
            }
        }
        self.past_eq = false;
    }

    fn scalar(&mut self, value: String, line: usize) {
        if self.past_eq {
            if let Some((key, key_line)) = self.key.take() {
                self.push(key_line, Statement::Pair(key, value));
                self.past_eq = false;
                return;
            }
        }
        self.flush();
        self.key = Some((value, line));
    }

    fn open(&mut self, line: usize) {
        if self.past_eq {
            if let Some((key, key_line)) = self.key.take() {
                self.push(key_line, Statement::Open(key));
                self.past_eq = false;
                return;
            }
        }
        self.flush();
        self.push(line, Statement::Other("{".to_owned()));
    }
}

/// Whether the single byte token ending at `end` opens a container
fn token_is_open(bytes: &[u8], end: usize) -> bool {
    end > 0 && matches!(bytes[end - 1], b'{' | b'[')
}

/// Tokenizes a province block into positioned statements
pub fn statements(block: &str) -> Result<Vec<Line>, ReaderError> {
    let bytes = block.as_bytes();
    let mut reader = TokenReader::from_slice(bytes);
    let mut grouper = Grouper::new();
    let mut line = 0;
    let mut counted = 0;
    while let Some(token) = reader.next()? {
        let scalar = match token {
            Token::Quoted(s) | Token::Unquoted(s) => Some(scalar_string(s)),
            Token::Open | Token::Close => None,
            Token::Operator(op) => {
                // only assignments pair a key with its value
                grouper.past_eq = op == Operator::Equal && grouper.key.is_some();
                continue;
            }
        };
        let end = reader.position().min(bytes.len());
        line += bytes[counted..end].iter().filter(|b| **b == b'\n').count();
        counted = end;
        match (scalar, token_is_open(bytes, end)) {
            (Some(scalar), _) => grouper.scalar(scalar, line),
            (None, true) => grouper.open(line),
            (None, false) => {
                grouper.flush();
                grouper.push(line, Statement::Close);
            }
        }
    }
    grouper.flush();
    Ok(grouper.lines)
}
