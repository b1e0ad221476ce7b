use winnow::combinator::{alt, cut_err, delimited, eof, opt, preceded, repeat, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{none_of, rest, take_till, take_while};

/// A single classified line of key-file input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'i> {
    Blank,
    Comment,
    Group(&'i str),
    Entry { key: &'i str, value: &'i str },
}

// -- Whitespace & comments --------------------------------------------------

fn blanks(input: &mut &str) -> ModalResult<()> {
    take_while(0.., [' ', '\t']).void().parse_next(input)
}

fn comment(input: &mut &str) -> ModalResult<()> {
    ('#', rest).void().parse_next(input)
}

// -- Groups & entries -------------------------------------------------------

fn group_header<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited(
        '[',
        cut_err(take_while(1.., |c: char| {
            c != '[' && c != ']' && !c.is_control()
        }))
        .context(StrContext::Expected(StrContextValue::Description(
            "group name",
        ))),
        cut_err(']'),
    )
    .parse_next(input)
}

fn entry<'i>(input: &mut &'i str) -> ModalResult<(&'i str, &'i str)> {
    let key = take_till(1.., '=').parse_next(input)?;
    '='.parse_next(input)?;
    let value = rest.parse_next(input)?;
    Ok((key.trim_end(), value.trim()))
}

pub(crate) fn line<'i>(input: &mut &'i str) -> ModalResult<Line<'i>> {
    blanks(input)?;
    alt((
        eof.value(Line::Blank),
        comment.value(Line::Comment),
        terminated(group_header, blanks).map(Line::Group),
        entry.map(|(key, value)| Line::Entry { key, value }),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "group header, key=value pair or comment",
    )))
    .parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn escape(input: &mut &str) -> ModalResult<char> {
    preceded(
        '\\',
        cut_err(alt((
            's'.value(' '),
            'n'.value('\n'),
            't'.value('\t'),
            'r'.value('\r'),
            '\\'.value('\\'),
            ';'.value(';'),
        )))
        .context(StrContext::Expected(StrContextValue::Description(
            "escape sequence",
        ))),
    )
    .parse_next(input)
}

fn separator(input: &mut &str) -> ModalResult<char> {
    ';'.parse_next(input)
}

fn list_element(input: &mut &str) -> ModalResult<String> {
    repeat(0.., alt((escape, none_of(['\\', ';']))))
        .fold(String::new, |mut acc, c| {
            acc.push(c);
            acc
        })
        .parse_next(input)
}

/// A `;`-separated list; a single trailing separator is optional.
pub(crate) fn string_list(input: &mut &str) -> ModalResult<Vec<String>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(list_element.parse_next(input)?);
        if opt(separator).parse_next(input)?.is_none() {
            break;
        }
    }
    Ok(items)
}

pub(crate) fn string_value(input: &mut &str) -> ModalResult<String> {
    repeat(0.., alt((escape, none_of('\\'))))
        .fold(String::new, |mut acc, c| {
            acc.push(c);
            acc
        })
        .parse_next(input)
}
