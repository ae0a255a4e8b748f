//! Query-string language accepted by the search mirror.
//!
//! A small subset of the Lucene query-string syntax:
//!
//! - `*` matches every document
//! - `field:value` for `id`, `text`, `creationDate` and `post.id`
//! - bare terms match the text, the id or the creation date
//! - `"quoted phrases"` form a single term, `term*` is a prefix match
//! - `AND` binds tighter than `OR`; adjacent terms default to `OR`
//! - `-term` / `NOT term` negate a term

use chrono::NaiveDate;

use crate::schema::Comment;
use crate::services::search::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Text,
    CreationDate,
    PostId,
}

impl Field {
    fn parse(name: &str) -> Result<Self, SearchError> {
        match name {
            "id" => Ok(Field::Id),
            "text" => Ok(Field::Text),
            "creationDate" => Ok(Field::CreationDate),
            "post.id" => Ok(Field::PostId),
            other => Err(SearchError::InvalidQuery(format!("unknown field '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Whole-value (or, for text, substring) match; stored lowercased
    Exact(String),
    /// Prefix match; stored lowercased
    Prefix(String),
    /// Field has any value
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    All,
    Field(Field, Matcher),
    Any(Matcher),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub negated: bool,
    pub term: Term,
}

/// Parsed query in disjunctive normal form: a document matches when every
/// clause of at least one group matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    groups: Vec<Vec<Clause>>,
}

#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
    negated: bool,
    field_split: Option<usize>,
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        !self.quoted && self.text == keyword
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

fn tokenize(input: &str) -> Result<Vec<Token>, SearchError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut text = String::new();
        let mut quoted = false;
        let mut negated = false;
        let mut field_split = None;

        if c == '-' {
            chars.next();
            match chars.peek() {
                Some(next) if !next.is_whitespace() => negated = true,
                _ => text.push(c),
            }
        }

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' => {
                    quoted = true;
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '"' {
                            closed = true;
                            break;
                        }
                        text.push(inner);
                    }
                    if !closed {
                        return Err(SearchError::InvalidQuery("unterminated quote".to_string()));
                    }
                }
                ':' if field_split.is_none() && !quoted => {
                    field_split = Some(text.len());
                    text.push(c);
                }
                _ => text.push(c),
            }
        }

        tokens.push(Token { text, quoted, negated, field_split });
    }

    Ok(tokens)
}

fn parse_matcher(raw: &str, quoted: bool) -> Result<Matcher, SearchError> {
    if raw.is_empty() {
        return Err(SearchError::InvalidQuery("empty term".to_string()));
    }
    if !quoted && raw == "*" {
        return Ok(Matcher::Present);
    }
    if !quoted && raw.len() > 1 && raw.ends_with('*') {
        return Ok(Matcher::Prefix(raw[..raw.len() - 1].to_lowercase()));
    }
    Ok(Matcher::Exact(raw.to_lowercase()))
}

fn parse_clause(token: Token, negated: bool) -> Result<Clause, SearchError> {
    let negated = negated != token.negated;
    let text = token.text.as_str();

    if !token.quoted && text == "*" {
        return Ok(Clause { negated, term: Term::All });
    }

    let term = match token.field_split {
        Some(pos) => {
            let field = Field::parse(&text[..pos])?;
            let matcher = parse_matcher(&text[pos + 1..], token.quoted)?;
            validate_typed_value(field, &matcher)?;
            Term::Field(field, matcher)
        }
        None => Term::Any(parse_matcher(text, token.quoted)?),
    };

    Ok(Clause { negated, term })
}

fn validate_typed_value(field: Field, matcher: &Matcher) -> Result<(), SearchError> {
    let Matcher::Exact(value) = matcher else {
        return Ok(());
    };
    match field {
        Field::Id | Field::PostId => value
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| SearchError::InvalidQuery(format!("'{}' is not a number", value))),
        Field::CreationDate => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| SearchError::InvalidQuery(format!("'{}' is not a date", value))),
        Field::Text => Ok(()),
    }
}

impl SearchQuery {
    /// Parse a query string
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }

        let mut groups: Vec<Vec<Clause>> = vec![Vec::new()];
        let mut pending: Option<Operator> = None;
        let mut negate_next = false;

        for token in tokens {
            let operator = if token.is_keyword("AND") {
                Some(Operator::And)
            } else if token.is_keyword("OR") {
                Some(Operator::Or)
            } else {
                None
            };

            if let Some(operator) = operator {
                let empty = groups.last().map_or(true, |g| g.is_empty());
                if empty || pending.is_some() || negate_next {
                    return Err(SearchError::InvalidQuery(format!(
                        "unexpected operator {:?}",
                        operator
                    )));
                }
                pending = Some(operator);
                continue;
            }

            if token.is_keyword("NOT") {
                negate_next = !negate_next;
                continue;
            }

            let clause = parse_clause(token, negate_next)?;
            negate_next = false;

            let joins_current = pending.take() == Some(Operator::And);
            let current_empty = groups.last().map_or(true, |g| g.is_empty());
            if joins_current || current_empty {
                if let Some(group) = groups.last_mut() {
                    group.push(clause);
                }
            } else {
                groups.push(vec![clause]);
            }
        }

        if pending.is_some() || negate_next {
            return Err(SearchError::InvalidQuery("query ends with an operator".to_string()));
        }

        Ok(Self { groups })
    }

    /// Query matching every document
    pub fn match_all() -> Self {
        Self {
            groups: vec![vec![Clause { negated: false, term: Term::All }]],
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.groups.iter().any(|group| {
            group
                .iter()
                .all(|clause| clause.term.matches(comment) != clause.negated)
        })
    }

    pub fn groups(&self) -> &[Vec<Clause>] {
        &self.groups
    }
}

fn text_matches(text: Option<&str>, matcher: &Matcher) -> bool {
    let Some(text) = text else {
        return false;
    };
    let lowered = text.to_lowercase();
    match matcher {
        Matcher::Exact(needle) => lowered.contains(needle.as_str()),
        Matcher::Prefix(prefix) => lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.starts_with(prefix.as_str())),
        Matcher::Present => true,
    }
}

fn rendered_matches(rendered: Option<String>, matcher: &Matcher) -> bool {
    let Some(rendered) = rendered else {
        return false;
    };
    match matcher {
        Matcher::Exact(value) => rendered == *value,
        Matcher::Prefix(prefix) => rendered.starts_with(prefix.as_str()),
        Matcher::Present => true,
    }
}

impl Term {
    fn matches(&self, comment: &Comment) -> bool {
        let id = || comment.id.map(|id| id.to_string());
        let date = || comment.creation_date.map(|d| d.format("%Y-%m-%d").to_string());

        match self {
            Term::All => true,
            Term::Field(Field::Id, matcher) => rendered_matches(id(), matcher),
            Term::Field(Field::PostId, matcher) => {
                rendered_matches(comment.post.map(|p| p.id.to_string()), matcher)
            }
            Term::Field(Field::CreationDate, matcher) => rendered_matches(date(), matcher),
            Term::Field(Field::Text, matcher) => text_matches(comment.text.as_deref(), matcher),
            Term::Any(matcher) => {
                text_matches(comment.text.as_deref(), matcher)
                    || rendered_matches(id(), matcher)
                    || rendered_matches(date(), matcher)
            }
        }
    }
}
