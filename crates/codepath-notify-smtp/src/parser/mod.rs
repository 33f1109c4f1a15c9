//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines.
///
/// - Single: `250 OK`
/// - Multi: `250-smtp.gmail.com at your service`, `250-SIZE 35882577`, `250 SMTPUTF8`
///
/// # Errors
///
/// Returns an error if a line is malformed or the lines disagree on the code.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("empty reply".into()));
    };

    let code = reply_code(first)?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if reply_code(line)? != code {
            return Err(Error::Protocol(format!(
                "reply code changed mid-reply: {line}"
            )));
        }
        message.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

fn reply_code(line: &str) -> Result<u16> {
    let digits = line
        .get(..3)
        .ok_or_else(|| Error::Protocol(format!("reply too short: {line}")))?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("invalid reply code: {digits}")));
    }
    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => {}
        Some(_) => return Err(Error::Protocol(format!("malformed reply line: {line}"))),
    }
    digits
        .parse()
        .map_err(|_| Error::Protocol(format!("invalid reply code: {digits}")))
}

/// Checks if a line is the last line of a reply.
///
/// Continuation lines use `-` after the code; the last line uses a space or
/// carries no text at all.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}
