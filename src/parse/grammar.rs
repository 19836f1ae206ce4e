use winnow::ascii::space0;
use winnow::combinator::{alt, cut_err, opt, preceded};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take, take_while};

use crate::{Condition, RuleConfig};

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

// -- Arguments --------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    'x' => {
                        let hex = take(2usize).parse_next(input)?;
                        match u8::from_str_radix(hex, 16) {
                            Ok(byte) if byte.is_ascii() => s.push(char::from(byte)),
                            _ => {
                                s.push_str("\\x");
                                s.push_str(hex);
                            }
                        }
                    }
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn bare_argument<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '/' | '@' | ':' | '.' | '+')
    })
    .parse_next(input)
}

fn argument(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, bare_argument.map(str::to_owned)))
        .context(StrContext::Expected(StrContextValue::Description("argument")))
        .parse_next(input)
}

/// `(` [arg] (`,` [arg])* `)`; empty positions are unset arguments.
fn argument_list(input: &mut &str) -> ModalResult<Vec<Option<String>>> {
    '('.parse_next(input)?;
    let mut args = Vec::new();
    if opt(')').parse_next(input)?.is_some() {
        return Ok(args);
    }
    loop {
        args.push(opt(argument).parse_next(input)?);
        if opt(')').parse_next(input)?.is_some() {
            return Ok(args);
        }
        cut_err((',', space0))
            .context(StrContext::Expected(StrContextValue::CharLiteral(',')))
            .parse_next(input)?;
    }
}

// -- Rules ------------------------------------------------------------------

fn connector(input: &mut &str) -> ModalResult<Condition> {
    alt((
        '.'.value(Condition::And),
        " + ".value(Condition::Or),
        preceded(opt('\r'), '\n').value(Condition::With),
    ))
    .parse_next(input)
}

/// `["not "] field ":" operation argument_list [connector rule]`
pub fn rule(input: &mut &str) -> ModalResult<RuleConfig> {
    let negated = opt("not ").parse_next(input)?.is_some();

    let field = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description("field")))
        .parse_next(input)?;
    cut_err(':').parse_next(input)?;
    let operation = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "operation",
        )))
        .parse_next(input)?;
    let args = cut_err(argument_list).parse_next(input)?;

    let mut config = RuleConfig::new().field(field).operation(operation);
    for (idx, arg) in args.into_iter().enumerate() {
        if let Some(raw) = arg {
            config = config.argument(idx, &raw);
        }
    }
    if negated {
        config = config.negate();
    }

    if let Some(condition) = opt(connector).parse_next(input)? {
        let child = cut_err(rule).parse_next(input)?;
        config = config.chain(condition, child);
    }
    Ok(config)
}
