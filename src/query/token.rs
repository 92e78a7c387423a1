//! Query tokenizer
//!
//! Splits query text on whitespace and commas, keeping quoted literals
//! (single or double quotes) atomic so they may contain spaces. Quoted
//! tokens remember that they were quoted: the parser never treats them as
//! keywords or numbers.

use super::errors::{CompileError, CompileResult};

/// One token of query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text, with surrounding quotes already stripped
    pub text: String,
    /// True when the token came from a quoted literal
    pub quoted: bool,
}

impl Token {
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    /// Case-insensitive keyword check; quoted tokens are never keywords
    pub fn is_keyword(&self, keyword: &str) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Tokenizes a query line.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() || c == ',' => {
                if !current.is_empty() {
                    tokens.push(Token::bare(std::mem::take(&mut current)));
                }
            }
            '"' | '\'' => {
                if !current.is_empty() {
                    tokens.push(Token::bare(std::mem::take(&mut current)));
                }
                let quote = c;
                let mut literal = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    literal.push(c);
                }
                if !closed {
                    return Err(CompileError::unterminated_string());
                }
                tokens.push(Token::quoted(literal));
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(Token::bare(current));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_whitespace_and_commas_separate() {
        let tokens = tokenize("GET season, tm,age FROM players").unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["GET", "season", "tm", "age", "FROM", "players"]
        );
        assert!(tokens.iter().all(|t| !t.quoted));
    }

    #[test]
    fn test_quoted_literal_is_atomic() {
        let tokens = tokenize("FILTER name = \"San Antonio Spurs\"").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].text, "San Antonio Spurs");
        assert!(tokens[3].quoted);
    }

    #[test]
    fn test_single_quotes() {
        let tokens = tokenize("season = '2024'").unwrap();
        assert_eq!(tokens[2], Token::quoted("2024"));
    }

    #[test]
    fn test_quoted_token_is_not_a_keyword() {
        let tokens = tokenize("\"from\"").unwrap();
        assert!(!tokens[0].is_keyword("from"));
        let tokens = tokenize("FROM").unwrap();
        assert!(tokens[0].is_keyword("from"));
    }

    #[test]
    fn test_function_call_stays_whole() {
        let tokens = tokenize("GET COUNT(player), AVG(age) FROM players").unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["GET", "COUNT(player)", "AVG(age)", "FROM", "players"]
        );
    }

    #[test]
    fn test_unterminated_quote_rejected() {
        let err = tokenize("FILTER name = \"unclosed").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_UNTERMINATED_STRING");
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
