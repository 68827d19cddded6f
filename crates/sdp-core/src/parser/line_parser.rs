//! SDP line parsing utilities
//!
//! Each SDP line has the format `<type>=<value>` where type is a single
//! lowercase character. Line endings (CRLF or LF) are stripped by the caller
//! or by [`parse_sdp_line`] itself.

use nom::{
    character::complete::{char, not_line_ending, satisfy},
    IResult,
};

/// Parse an SDP line into its type character and trimmed value.
///
/// ```
/// use chancfg_sdp_core::parser::parse_sdp_line;
///
/// let (_, (key, value)) = parse_sdp_line("a=rtpmap:96 MP2T/90000").unwrap();
/// assert_eq!(key, 'a');
/// assert_eq!(value, "rtpmap:96 MP2T/90000");
/// ```
pub fn parse_sdp_line(input: &str) -> IResult<&str, (char, &str)> {
    let (input, key) = satisfy(|c| c.is_ascii_lowercase())(input)?;
    let (input, _) = char('=')(input)?;
    let (input, value) = not_line_ending(input)?;

    // Handle different line endings (CRLF, LF)
    let input = input.trim_start_matches(['\r', '\n']);

    Ok((input, (key, value.trim())))
}
