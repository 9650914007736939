//! N-Triples reading and writing, plus a small SPARQL-Update applier.
//!
//! The reader accepts the N-Triples grammar extended with relative IRIs
//! (resolved against a base), the `a` keyword and the `;` / `,` list
//! abbreviations. That is enough for the request bodies the server takes as
//! `text/turtle` or `application/n-triples`. The writer always produces plain
//! N-Triples, which is also valid Turtle.

use thiserror::Error;

use super::{Graph, Iri, Literal, Term, Triple, vocab};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IoError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unsupported update operation: {0}")]
    UnsupportedUpdate(String),

    #[error("body is not valid UTF-8")]
    InvalidEncoding,
}

type Result<T> = std::result::Result<T, IoError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
    A,
    Dot,
    Semicolon,
    Comma,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        IoError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '<' => Token::Iri(self.read_iri()?),
            '_' => Token::BlankNode(self.read_blank_node()?),
            '"' => Token::Literal(self.read_literal()?),
            '.' => {
                self.bump();
                Token::Dot
            }
            ';' => {
                self.bump();
                Token::Semicolon
            }
            ',' => {
                self.bump();
                Token::Comma
            }
            'a' => {
                self.bump();
                match self.peek() {
                    Some(n) if !n.is_whitespace() && n != '<' => {
                        return Err(self.error("unexpected bare word"));
                    }
                    _ => Token::A,
                }
            }
            other => return Err(self.error(format!("unexpected character '{other}'"))),
        };
        Ok(Some(token))
    }

    fn read_iri(&mut self) -> Result<String> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(value),
                Some('\\') => value.push(self.read_escape()?),
                Some(c) if c.is_whitespace() => return Err(self.error("whitespace in IRI")),
                Some(c) => value.push(c),
                None => return Err(IoError::UnexpectedEof),
            }
        }
    }

    fn read_blank_node(&mut self) -> Result<String> {
        self.bump();
        if self.bump() != Some(':') {
            return Err(self.error("expected ':' after '_'"));
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.bump();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("empty blank node label"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn read_literal(&mut self) -> Result<Literal> {
        self.bump();
        let mut lexical = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => lexical.push(self.read_escape()?),
                Some(c) => lexical.push(c),
                None => return Err(IoError::UnexpectedEof),
            }
        }

        match self.peek() {
            Some('@') => {
                self.bump();
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        self.bump();
                    } else {
                        break;
                    }
                }
                if start == self.pos {
                    return Err(self.error("empty language tag"));
                }
                Ok(Literal::lang(lexical, &self.input[start..self.pos]))
            }
            Some('^') => {
                self.bump();
                if self.bump() != Some('^') || self.peek() != Some('<') {
                    return Err(self.error("expected '^^<' before datatype"));
                }
                let datatype = self.read_iri()?;
                Ok(Literal::typed(lexical, Iri::new(datatype)))
            }
            _ => Ok(Literal::simple(lexical)),
        }
    }

    fn read_escape(&mut self) -> Result<char> {
        let c = self.bump().ok_or(IoError::UnexpectedEof)?;
        let simple = match c {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '"' => '"',
            '\'' => '\'',
            '\\' => '\\',
            'u' => return self.read_code_point(4),
            'U' => return self.read_code_point(8),
            other => return Err(self.error(format!("invalid escape '\\{other}'"))),
        };
        Ok(simple)
    }

    fn read_code_point(&mut self, digits: usize) -> Result<char> {
        let start = self.pos;
        for _ in 0..digits {
            self.bump().ok_or(IoError::UnexpectedEof)?;
        }
        u32::from_str_radix(&self.input[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid unicode escape"))
    }
}

/// Parse a body into a graph, resolving relative IRIs against `base`.
pub fn parse(input: &str, base: &str) -> Result<Graph> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }

    let mut graph = Graph::new();
    let mut iter = tokens.into_iter().peekable();
    while iter.peek().is_some() {
        let subject = match iter.next() {
            Some(Token::Iri(iri)) => Term::Iri(Iri::new(resolve(base, &iri))),
            Some(Token::BlankNode(label)) => Term::BlankNode(label),
            _ => return Err(statement_error("expected subject")),
        };

        'predicates: loop {
            let predicate = match iter.next() {
                Some(Token::Iri(iri)) => Iri::new(resolve(base, &iri)),
                Some(Token::A) => Iri::new(vocab::rdf::TYPE),
                _ => return Err(statement_error("expected predicate")),
            };

            loop {
                let object = match iter.next() {
                    Some(Token::Iri(iri)) => Term::Iri(Iri::new(resolve(base, &iri))),
                    Some(Token::BlankNode(label)) => Term::BlankNode(label),
                    Some(Token::Literal(literal)) => Term::Literal(literal),
                    _ => return Err(statement_error("expected object")),
                };
                graph.add(Triple::new(subject.clone(), predicate.clone(), object));

                match iter.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::Semicolon) => {
                        if iter.peek() == Some(&Token::Dot) {
                            iter.next();
                            break 'predicates;
                        }
                        continue 'predicates;
                    }
                    // A trailing '.' is optional inside update data blocks.
                    Some(Token::Dot) | None => break 'predicates,
                    _ => return Err(statement_error("expected '.', ';' or ','")),
                }
            }
        }
    }

    Ok(graph)
}

fn statement_error(message: &str) -> IoError {
    IoError::Syntax {
        offset: 0,
        message: message.to_string(),
    }
}

/// Resolve `reference` against `base` (RFC 3986, without percent normalisation).
pub fn resolve(base: &str, reference: &str) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }

    let base_no_fragment = base.split('#').next().unwrap_or(base);
    if reference.is_empty() {
        return base_no_fragment.to_string();
    }
    if reference.starts_with('#') {
        return format!("{base_no_fragment}{reference}");
    }

    let base_no_query = base_no_fragment.split('?').next().unwrap_or(base_no_fragment);
    if reference.starts_with('?') {
        return format!("{base_no_query}{reference}");
    }

    let (scheme, rest) = match base_no_query.split_once(':') {
        Some(parts) => parts,
        None => return reference.to_string(),
    };
    if let Some(net_path) = reference.strip_prefix("//") {
        return format!("{scheme}://{net_path}");
    }

    let (authority, path) = match rest.strip_prefix("//") {
        Some(hier) => match hier.find('/') {
            Some(idx) => (format!("//{}", &hier[..idx]), &hier[idx..]),
            None => (format!("//{hier}"), ""),
        },
        None => (String::new(), rest),
    };

    let merged = if reference.starts_with('/') {
        reference.to_string()
    } else {
        match path.rfind('/') {
            Some(idx) => format!("{}{}", &path[..=idx], reference),
            None if !authority.is_empty() => format!("/{reference}"),
            None => reference.to_string(),
        }
    };

    format!("{scheme}:{authority}{}", remove_dot_segments(&merged))
}

fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(idx) => {
            let scheme = &reference[..idx];
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn remove_dot_segments(path: &str) -> String {
    let (path, suffix) = match path.find(['?', '#']) {
        Some(idx) => path.split_at(idx),
        None => (path, ""),
    };

    let mut output: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => {
                if i == last {
                    output.push("");
                }
            }
            ".." => {
                if output.len() > 1 {
                    output.pop();
                }
                if i == last {
                    output.push("");
                }
            }
            other => output.push(other),
        }
    }
    format!("{}{}", output.join("/"), suffix)
}

/// Serialize a single term in N-Triples syntax.
pub fn write_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => write_iri(iri),
        Term::BlankNode(label) => format!("_:{label}"),
        Term::Literal(literal) => {
            let mut out = String::with_capacity(literal.lexical.len() + 2);
            out.push('"');
            for c in literal.lexical.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
            if let Some(language) = &literal.language {
                out.push('@');
                out.push_str(language);
            } else if let Some(datatype) = &literal.datatype {
                if datatype.as_str() != vocab::xsd::STRING {
                    out.push_str("^^");
                    out.push_str(&write_iri(datatype));
                }
            }
            out
        }
    }
}

fn write_iri(iri: &Iri) -> String {
    let mut out = String::with_capacity(iri.as_str().len() + 2);
    out.push('<');
    for c in iri.as_str().chars() {
        match c {
            '>' => out.push_str("\\u003E"),
            '\\' => out.push_str("\\u005C"),
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

/// Serialize triples, one statement per line.
pub fn write<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> String {
    let mut out = String::new();
    for triple in triples {
        out.push_str(&write_term(&triple.subject));
        out.push(' ');
        out.push_str(&write_iri(&triple.predicate));
        out.push(' ');
        out.push_str(&write_term(&triple.object));
        out.push_str(" .\n");
    }
    out
}

/// Apply a sequence of `INSERT DATA { .. }` / `DELETE DATA { .. }` operations,
/// separated by `;`, to `graph`.
pub fn apply_update(graph: &mut Graph, update: &str, base: &str) -> Result<()> {
    let mut rest = update.trim_start();
    while !rest.is_empty() {
        let open = rest
            .find('{')
            .ok_or_else(|| IoError::UnsupportedUpdate(rest.trim().to_string()))?;
        let keyword = rest[..open]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let insert = match keyword.as_str() {
            "INSERT DATA" => true,
            "DELETE DATA" => false,
            other => return Err(IoError::UnsupportedUpdate(other.to_string())),
        };

        let body_start = open + 1;
        let close = find_closing_brace(&rest[body_start..])
            .map(|idx| body_start + idx)
            .ok_or(IoError::UnexpectedEof)?;
        let data = parse(&rest[body_start..close], base)?;
        for triple in data.iter() {
            if insert {
                graph.add(triple.clone());
            } else {
                graph.remove(triple);
            }
        }

        rest = rest[close + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(';') {
            rest = next.trim_start();
        }
    }
    Ok(())
}

fn find_closing_brace(input: &str) -> Option<usize> {
    let mut in_literal = false;
    let mut in_iri = false;
    let mut escaped = false;
    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_literal => escaped = true,
            '"' if !in_iri => in_literal = !in_literal,
            '<' if !in_literal => in_iri = true,
            '>' if in_iri => in_iri = false,
            '}' if !in_literal && !in_iri => return Some(idx),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://example.org/resource";

    #[test]
    fn test_parse_relative_and_absolute() {
        let graph = parse(
            "<> <http://purl.org/dc/terms/title> \"A title\"@en .\n\
             <#frag> a <http://example.org/Type> .",
            BASE,
        )
        .unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&Triple::new(
            Iri::new(BASE),
            Iri::new("http://purl.org/dc/terms/title"),
            Literal::lang("A title", "en"),
        )));
        assert!(graph.contains(&Triple::new(
            Iri::new("http://example.org/resource#frag"),
            Iri::new(vocab::rdf::TYPE),
            Iri::new("http://example.org/Type"),
        )));
    }

    #[test]
    fn test_parse_predicate_and_object_lists() {
        let graph = parse(
            "<s> <p> \"1\", \"2\" ; <q> _:b1 .",
            "http://example.org/dir/",
        )
        .unwrap();
        assert_eq!(graph.len(), 3);
        assert!(
            graph
                .iter()
                .all(|t| t.subject == Term::iri("http://example.org/dir/s"))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("<s> <p> .", BASE).is_err());
        assert!(parse("<s> <p> \"unterminated", BASE).is_err());
        assert!(parse("hello world", BASE).is_err());
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(BASE, ""), BASE);
        assert_eq!(resolve(BASE, "child"), "http://example.org/child");
        assert_eq!(
            resolve("http://example.org/a/b/", "../c"),
            "http://example.org/a/c"
        );
        assert_eq!(resolve(BASE, "/x/y"), "http://example.org/x/y");
        assert_eq!(resolve(BASE, "urn:test"), "urn:test");
        assert_eq!(
            resolve("trellis:data/resource", "#me"),
            "trellis:data/resource#me"
        );
    }

    #[test]
    fn test_write_escapes_literals() {
        let triple = Triple::new(
            Iri::new("http://example.org/s"),
            Iri::new("http://example.org/p"),
            Literal::simple("line\n\"quoted\""),
        );
        assert_eq!(
            write([&triple]),
            "<http://example.org/s> <http://example.org/p> \"line\\n\\\"quoted\\\"\" .\n"
        );
    }

    #[test]
    fn test_written_output_parses_back() {
        let triple = Triple::new(
            Iri::new("http://example.org/s"),
            Iri::new("http://example.org/p"),
            Literal::typed("5", Iri::new("http://www.w3.org/2001/XMLSchema#integer")),
        );
        let graph = parse(&write([&triple]), BASE).unwrap();
        assert!(graph.contains(&triple));
    }

    #[test]
    fn test_apply_update() {
        let mut graph = parse("<> <http://example.org/p> \"old\" .", BASE).unwrap();
        apply_update(
            &mut graph,
            "DELETE DATA { <> <http://example.org/p> \"old\" } ;\n\
             INSERT DATA { <> <http://example.org/p> \"new } braces\" . }",
            BASE,
        )
        .unwrap();

        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&Triple::new(
            Iri::new(BASE),
            Iri::new("http://example.org/p"),
            Literal::simple("new } braces"),
        )));
    }

    #[test]
    fn test_apply_update_rejects_where_clauses() {
        let mut graph = Graph::new();
        let err = apply_update(&mut graph, "DELETE WHERE { ?s ?p ?o }", BASE).unwrap_err();
        assert_eq!(err, IoError::UnsupportedUpdate("DELETE WHERE".to_string()));
    }
}
