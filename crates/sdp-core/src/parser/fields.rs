//! Field parsers for the individual SDP line types.
//!
//! Each parser takes the value part of a line (after `<type>=`) and must
//! consume it completely; trailing content is a parse failure.

use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, space0, space1, u16 as dec_u16, u64 as dec_u64},
    combinator::{all_consuming, opt, rest},
    multi::separated_list1,
    sequence::{preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::types::{Attribute, Bandwidth, ConnectionData, MediaDescription, Origin, Timing};

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// Parse the o= value: exactly six whitespace separated tokens.
pub fn origin(input: &str) -> IResult<&str, Origin> {
    let (input, tokens) = all_consuming(terminated(separated_list1(space1, token), space0))(input)?;
    if tokens.len() != 6 {
        return Err(fail(input));
    }
    Ok((
        input,
        Origin {
            username: tokens[0].to_string(),
            session_id: tokens[1].to_string(),
            session_version: tokens[2].to_string(),
            net_type: tokens[3].to_string(),
            addr_type: tokens[4].to_string(),
            unicast_address: tokens[5].to_string(),
        },
    ))
}

/// Parse the c= value: `<nettype> <addrtype> <address>[/<ttl>[/<count>]]`
pub fn connection(input: &str) -> IResult<&str, ConnectionData> {
    let (input, (net_type, _, addr_type, _, addr_field)) =
        all_consuming(tuple((token, space1, token, space1, token)))(input)?;

    let mut parts = addr_field.split('/');
    let address = parts.next().unwrap_or_default();
    let ttl = match parts.next() {
        Some(ttl) => Some(ttl.parse::<u8>().map_err(|_| fail(addr_field))?),
        None => None,
    };
    if let Some(count) = parts.next() {
        count.parse::<u16>().map_err(|_| fail(addr_field))?;
    }
    if address.is_empty() || parts.next().is_some() {
        return Err(fail(addr_field));
    }

    Ok((
        input,
        ConnectionData {
            net_type: net_type.to_string(),
            addr_type: addr_type.to_string(),
            address: address.to_string(),
            ttl,
        },
    ))
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
}

/// Parse the t= value: two decimal integers
pub fn timing(input: &str) -> IResult<&str, Timing> {
    let (input, (start, stop)) = all_consuming(separated_pair(dec_u64, space1, dec_u64))(input)?;
    Ok((input, Timing { start, stop }))
}

/// Parse the b= value: `<bwtype>:<bandwidth>`
pub fn bandwidth(input: &str) -> IResult<&str, Bandwidth> {
    let (input, (bw_type, value)) = all_consuming(separated_pair(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'),
        char(':'),
        dec_u64,
    ))(input)?;
    Ok((input, Bandwidth::new(bw_type, value)))
}

/// Parse the m= value: `<media> <port>[/<count>] <proto> <fmt> [<fmt>]*`
pub fn media(input: &str) -> IResult<&str, MediaDescription> {
    let (input, (media, _, port, port_count, _, protocol, _, formats)) = all_consuming(tuple((
        token,
        space1,
        dec_u16,
        opt(preceded(char('/'), dec_u16)),
        space1,
        token,
        space1,
        terminated(separated_list1(space1, token), space0),
    )))(input)?;

    let mut description = MediaDescription::new(
        media,
        port,
        protocol,
        formats.into_iter().map(str::to_string).collect(),
    );
    description.port_count = port_count;
    Ok((input, description))
}

/// Parse the a= value: `<name>` or `<name>:<value>`
///
/// Values are trimmed, so `a=source-filter: incl ...` yields `incl ...`.
pub fn attribute(input: &str) -> IResult<&str, Attribute> {
    let (input, (name, value)) = tuple((
        take_till1(|c: char| c == ':' || c.is_whitespace()),
        opt(preceded(char(':'), rest)),
    ))(input)?;
    if !input.trim().is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )));
    }
    Ok((
        input,
        Attribute {
            name: name.to_string(),
            value: value.map(|v: &str| v.trim().to_string()),
        },
    ))
}
