use nom::bytes::complete::tag;
use nom::character::complete::{digit1, one_of, space0};
use nom::combinator::opt;
use nom::error::{Error, ErrorKind};
use nom::sequence::{preceded, tuple};
use nom::IResult;

use crate::types::{Metric, Value};

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) enum MessageToken {
    /// A recognized key followed by its (not yet validated) value.
    Reading(Metric, Value),
    Unknown,
}

pub(crate) fn parse_message(msg: &str) -> MessageToken {
    match metric_prefix(msg) {
        Ok((payload, metric)) => MessageToken::Reading(metric, lenient_value(payload)),
        Err(_) => MessageToken::Unknown,
    }
}

/// Match the message against the prefix table, in table order.
fn metric_prefix(input: &str) -> IResult<&str, Metric> {
    for metric in Metric::ALL {
        if let Ok((rest, _)) = tag::<_, _, Error<&str>>(metric.prefix())(input) {
            return Ok((rest, metric));
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)))
}

/// Leading-integer semantics: an optional sign and a run of digits after
/// optional blanks, anything after that is ignored. No digits means 0.
fn lenient_value(payload: &str) -> Value {
    match signed_digits(payload) {
        Ok((_rest, value)) => value,
        Err(_) => 0,
    }
}

fn signed_digits(input: &str) -> IResult<&str, Value> {
    let (input, (sign, digits)) = preceded(space0, tuple((opt(one_of("+-")), digit1)))(input)?;
    let negative = sign == Some('-');
    // Saturate rather than wrap, huge readings must stay out of range.
    let value = digits.bytes().fold(0 as Value, |acc, d| {
        let d = Value::from(d - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        }
    });
    Ok((input, value))
}
