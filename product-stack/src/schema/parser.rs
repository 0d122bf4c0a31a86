//! Nom lexer for GraphQL SDL plus a token walk that extracts root fields.

use super::{OperationCategory, SchemaCatalog, SchemaError};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace1, none_of, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

const DEFINITION_KEYWORDS: [&str; 9] = [
    "type",
    "input",
    "enum",
    "interface",
    "union",
    "scalar",
    "schema",
    "extend",
    "directive",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    Directive(&'a str),
    Punct(char),
    Literal,
}

// =============================================================================
// LEXER
// =============================================================================

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('#'), take_while(|c: char| c != '\n' && c != '\r')))(input)
}

/// Whitespace, commas, comments and a byte order mark are insignificant.
fn ignored(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((multispace1, comment, tag(","), tag("\u{feff}")))),
    )(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn block_string(input: &str) -> IResult<&str, &str> {
    delimited(tag("\"\"\""), take_until("\"\"\""), tag("\"\"\""))(input)
}

fn quoted_string(input: &str) -> IResult<&str, &str> {
    delimited(
        char('"'),
        recognize(many0(alt((
            recognize(pair(char('\\'), anychar)),
            recognize(none_of("\"\\\n")),
        )))),
        char('"'),
    )(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    preceded(
        ignored,
        alt((
            // block strings first: `"""` also starts an empty quoted string
            value(Token::Literal, alt((block_string, quoted_string, number))),
            map(preceded(char('@'), name), Token::Directive),
            map(name, Token::Name),
            value(Token::Punct('.'), tag("...")),
            map(one_of("{}()[]:!=|&$"), Token::Punct),
        )),
    )(input)
}

fn tokenize(sdl: &str) -> Result<Vec<Token<'_>>, SchemaError> {
    match all_consuming(terminated(many0(token), ignored))(sdl) {
        Ok((_, tokens)) => Ok(tokens),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(sdl, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(sdl, "")),
    }
}

fn syntax_error(source: &str, rest: &str) -> SchemaError {
    let offset = source.len().saturating_sub(rest.len());
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |current| current.chars().count())
        + 1;

    SchemaError::Syntax { line, column }
}

// =============================================================================
// CATALOG EXTRACTION
// =============================================================================

struct RootTypes<'a> {
    query: &'a str,
    mutation: &'a str,
    subscription: &'a str,
}

impl<'a> RootTypes<'a> {
    fn category_of(&self, type_name: &str) -> Option<OperationCategory> {
        if type_name == self.query {
            Some(OperationCategory::Query)
        } else if type_name == self.mutation {
            Some(OperationCategory::Mutation)
        } else if type_name == self.subscription {
            Some(OperationCategory::Subscription)
        } else {
            None
        }
    }
}

/// Parse SDL text and collect the field names of its root operation types.
///
/// Object types are merged with their `extend type` blocks. Field arguments,
/// directives and descriptions are skipped; the parser does not type-check the
/// schema beyond what is needed to find field names.
pub fn parse_schema(sdl: &str) -> Result<SchemaCatalog, SchemaError> {
    let tokens = tokenize(sdl)?;
    let roots = root_types(&tokens);
    let mut catalog = SchemaCatalog::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Name("type") => {
                let Some(Token::Name(type_name)) = tokens.get(i + 1) else {
                    i += 1;
                    continue;
                };
                match find_body(&tokens, i + 2) {
                    Some(start) => {
                        let (fields, end) = body_fields(&tokens, start);
                        if let Some(category) = roots.category_of(type_name) {
                            for field in fields {
                                catalog.insert(category, field);
                            }
                        }
                        i = end;
                    }
                    None => i += 2,
                }
            }
            Token::Punct('{') => i = skip_block(&tokens, i),
            _ => i += 1,
        }
    }

    Ok(catalog)
}

fn root_types<'a>(tokens: &[Token<'a>]) -> RootTypes<'a> {
    let mut roots = RootTypes {
        query: "Query",
        mutation: "Mutation",
        subscription: "Subscription",
    };

    for (i, token) in tokens.iter().enumerate() {
        if *token != Token::Name("schema") {
            continue;
        }
        let Some(start) = find_body(tokens, i + 1) else {
            continue;
        };

        let mut j = start;
        while j + 2 < tokens.len() && tokens[j] != Token::Punct('}') {
            if let (Token::Name(operation), Token::Punct(':'), Token::Name(type_name)) =
                (tokens[j], tokens[j + 1], tokens[j + 2])
            {
                match operation {
                    "query" => roots.query = type_name,
                    "mutation" => roots.mutation = type_name,
                    "subscription" => roots.subscription = type_name,
                    _ => {}
                }
                j += 3;
            } else {
                j += 1;
            }
        }
    }

    roots
}

/// Index just past the `{` opening a definition body, if the definition
/// starting at `from` has one.
fn find_body(tokens: &[Token<'_>], from: usize) -> Option<usize> {
    let mut parens = 0usize;
    for (offset, token) in tokens[from.min(tokens.len())..].iter().enumerate() {
        match token {
            Token::Punct('(') => parens += 1,
            Token::Punct(')') => parens = parens.saturating_sub(1),
            Token::Punct('{') if parens == 0 => return Some(from + offset + 1),
            Token::Name(word) if parens == 0 && DEFINITION_KEYWORDS.contains(word) => return None,
            _ => {}
        }
    }
    None
}

/// Field names declared directly in a body, and the index after its `}`.
fn body_fields<'a>(tokens: &[Token<'a>], start: usize) -> (Vec<&'a str>, usize) {
    let mut fields = Vec::new();
    let mut depth = 1usize;
    let mut parens = 0usize;
    let mut j = start;

    while j < tokens.len() && depth > 0 {
        match tokens[j] {
            Token::Punct('{') => depth += 1,
            Token::Punct('}') => depth -= 1,
            Token::Punct('(') => parens += 1,
            Token::Punct(')') => parens = parens.saturating_sub(1),
            Token::Name(field) if depth == 1 && parens == 0 => {
                let opens_field = matches!(
                    tokens.get(j + 1),
                    Some(Token::Punct(':')) | Some(Token::Punct('('))
                );
                let is_type_ref = j > 0 && tokens[j - 1] == Token::Punct(':');
                if opens_field && !is_type_ref {
                    fields.push(field);
                }
            }
            _ => {}
        }
        j += 1;
    }

    (fields, j)
}

fn skip_block(tokens: &[Token<'_>], open: usize) -> usize {
    let mut depth = 0usize;
    let mut j = open;
    while j < tokens.len() {
        match tokens[j] {
            Token::Punct('{') => depth += 1,
            Token::Punct('}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return j + 1;
                }
            }
            _ => {}
        }
        j += 1;
    }
    j
}
