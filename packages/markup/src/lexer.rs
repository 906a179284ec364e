//! Lexer for HTML fragments using logos
//!
//! Only the outer shape of the markup is tokenized here: tags, text,
//! comments and declarations. Attribute lists are lexed separately by
//! [`lex_attributes`] once a start tag has been isolated.

use logos::{Lexer, Logos};

/// Top-level markup tokens
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    /// `<!-- ... -->`, the callback consumes up to the terminator
    #[token("<!--", comment)]
    Comment(&'src str),

    /// `<!DOCTYPE html>` and friends
    #[regex(r"<![A-Za-z][^>]*>")]
    Declaration,

    /// `<?xml ... ?>`
    #[regex(r"<\?[^>]*>")]
    ProcessingInstruction,

    /// `</name>`, carrying the tag name
    #[regex(r"</[A-Za-z][A-Za-z0-9:-]*[ \t\r\n\f]*>", end_tag)]
    EndTag(&'src str),

    /// `<name ...>`, carrying the full tag source up to and including `>`
    #[regex(r"<[A-Za-z][A-Za-z0-9:-]*", start_tag)]
    StartTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not open a tag
    #[token("<")]
    Lt,
}

fn comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> &'src str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => lex.bump(end + 3),
        None => lex.bump(rest.len()),
    }
    lex.slice()
}

fn end_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> &'src str {
    let slice = lex.slice();
    slice[2..slice.len() - 1].trim_end()
}

fn start_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> &'src str {
    let end = tag_end(lex.remainder());
    lex.bump(end);
    lex.slice()
}

/// Find the byte index just past the `>` closing a start tag.
///
/// Quotes only open after `=`, so stray apostrophes in unquoted values do
/// not swallow the rest of the input.
fn tag_end(rest: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut after_eq = false;

    for (index, ch) in rest.char_indices() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                after_eq = false;
            }
            Some(_) => {}
            None => match ch {
                '>' => return index + 1,
                '=' => after_eq = true,
                '"' | '\'' if after_eq => quote = Some(ch),
                c if c.is_whitespace() => {}
                _ => after_eq = false,
            },
        }
    }

    rest.len()
}

/// Tokens inside a start tag, after the tag name
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum AttrToken<'src> {
    #[regex(r#"[^ \t\r\n\f"'>=/]+"#, |lex| lex.slice())]
    Word(&'src str),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Quoted(&'src str),

    #[token("/")]
    Slash,

    #[token(">")]
    Close,
}

/// A lexed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'src> {
    pub name: &'src str,
    /// Raw (still entity-encoded) attribute values
    pub attrs: Vec<(&'src str, &'src str)>,
    pub self_closing: bool,
}

/// Split the source of a start tag into name and attributes
pub fn lex_start_tag(source: &str) -> StartTag<'_> {
    let body = source.strip_prefix('<').unwrap_or(source);
    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-'))
        .unwrap_or(body.len());
    let name = &body[..name_len];
    let rest = &body[name_len..];

    let (attrs, self_closing) = lex_attributes(rest);
    StartTag {
        name,
        attrs,
        self_closing,
    }
}

/// Lex an attribute list such as ` class="a" checked data-x=1 />`
fn lex_attributes(source: &str) -> (Vec<(&str, &str)>, bool) {
    let tokens: Vec<(AttrToken<'_>, std::ops::Range<usize>)> = AttrToken::lexer(source)
        .spanned()
        .filter_map(|(token, span)| token.ok().map(|token| (token, span)))
        .collect();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i].0 {
            AttrToken::Word(name) => {
                if matches!(tokens.get(i + 1), Some((AttrToken::Eq, _))) {
                    match tokens.get(i + 2) {
                        Some((AttrToken::Quoted(value), _)) => {
                            attrs.push((*name, *value));
                            i += 3;
                        }
                        Some((AttrToken::Word(_), span)) | Some((AttrToken::Slash, span)) => {
                            // Unquoted values may contain `/`; glue adjacent pieces back together.
                            let start = span.start;
                            let mut end = span.end;
                            let mut j = i + 2;
                            while let Some((token, next)) = tokens.get(j + 1) {
                                let adjacent = next.start == end;
                                let piece = matches!(token, AttrToken::Word(_) | AttrToken::Slash);
                                if !(adjacent && piece) {
                                    break;
                                }
                                end = next.end;
                                j += 1;
                            }
                            let mut value = &source[start..end];
                            if matches!(tokens.get(j + 1), Some((AttrToken::Close, _)) | None)
                                && value.len() > 1
                                && value.ends_with('/')
                            {
                                value = &value[..value.len() - 1];
                                self_closing = true;
                            }
                            attrs.push((*name, value));
                            i = j + 1;
                        }
                        _ => {
                            attrs.push((*name, ""));
                            i += 2;
                        }
                    }
                } else {
                    attrs.push((*name, ""));
                    i += 1;
                }
            }
            AttrToken::Slash => {
                self_closing = matches!(tokens.get(i + 1), Some((AttrToken::Close, _)) | None);
                i += 1;
            }
            AttrToken::Eq | AttrToken::Quoted(_) | AttrToken::Close => i += 1,
        }
    }

    (attrs, self_closing)
}

/// Bytes of `rest` up to and including the `</name>` closing a raw-text
/// element, or all of `rest` when it is never closed. The body is not lexed.
pub fn raw_text_end(rest: &str, name: &str) -> usize {
    for (index, _) in rest.match_indices("</") {
        let after = index + 2;
        let Some(candidate) = rest.get(after..after + name.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(name) {
            continue;
        }
        let tail = &rest[after + name.len()..];
        let boundary = tail
            .chars()
            .next()
            .map_or(true, |c| c == '>' || c == '/' || c.is_ascii_whitespace());
        if boundary {
            let close = after + name.len();
            return rest[close..].find('>').map_or(rest.len(), |gt| close + gt + 1);
        }
    }
    rest.len()
}

/// Lex markup into top-level tokens; unrecognized input becomes a stray `<`
pub fn lex(source: &str) -> impl Iterator<Item = Token<'_>> + '_ {
    Token::lexer(source).map(|result| result.unwrap_or(Token::Lt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_simple_paragraph() {
        let tokens: Vec<_> = lex("<p>Hello</p>").collect();
        assert_eq!(
            tokens,
            vec![Token::StartTag("<p>"), Token::Text("Hello"), Token::EndTag("p")]
        );
    }

    #[test]
    fn test_start_tag_with_gt_inside_quotes() {
        let tokens: Vec<_> = lex(r#"<a title="a > b" href="/x">x</a>"#).collect();
        assert_eq!(tokens[0], Token::StartTag(r#"<a title="a > b" href="/x">"#));
        assert_eq!(tokens[1], Token::Text("x"));
    }

    #[test]
    fn test_comments_and_doctype() {
        let tokens: Vec<_> = lex("<!DOCTYPE html><!-- a > b --><p></p>").collect();
        assert_eq!(tokens[0], Token::Declaration);
        assert_eq!(tokens[1], Token::Comment("<!-- a > b -->"));
        assert_eq!(tokens[2], Token::StartTag("<p>"));
    }

    #[test]
    fn test_stray_lt_is_text() {
        let tokens: Vec<_> = lex("a < b").collect();
        assert_eq!(tokens, vec![Token::Text("a "), Token::Lt, Token::Text(" b")]);
    }

    #[test]
    fn test_lex_attributes() {
        let tag = lex_start_tag(r#"<input type="checkbox" checked data-x='1'>"#);
        assert_eq!(tag.name, "input");
        assert_eq!(
            tag.attrs,
            vec![("type", "checkbox"), ("checked", ""), ("data-x", "1")]
        );
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_unquoted_value_with_slash() {
        let tag = lex_start_tag("<a href=/path/to/page>");
        assert_eq!(tag.attrs, vec![("href", "/path/to/page")]);
    }

    #[test]
    fn test_self_closing() {
        let tag = lex_start_tag("<br/>");
        assert_eq!(tag.name, "br");
        assert!(tag.self_closing);

        let tag = lex_start_tag(r#"<img src="a.png" />"#);
        assert_eq!(tag.attrs, vec![("src", "a.png")]);
        assert!(tag.self_closing);
    }

    #[test]
    fn test_raw_text_end() {
        let rest = "if (a<b) {} </SCRIPT >tail";
        assert_eq!(&rest[raw_text_end(rest, "script")..], "tail");
        let rest = "x</scripts></script>";
        assert_eq!(&rest[raw_text_end(rest, "script")..], "");
        assert_eq!(raw_text_end("never closed <b>", "style"), 16);
    }
}
