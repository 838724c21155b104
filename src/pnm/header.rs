//! PNM/PAM header parsing.
//!
//! A [`HeaderMachine`] consumes comment-filtered characters one at a time.
//! Fixed-field headers (P1..P6) collect two or three decimal fields; the
//! keyed PAM header (P7) collects `KEYWORD value` entries until `ENDHDR`.

use std::io::BufRead;

use log::{debug, warn};

use super::tokenizer::{Tokenizer, is_space};
use crate::error::PnmError;
use crate::pixel::PnmFormat;

const MAX_KEYWORD_LEN: usize = 32;

/// Parsed header of one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PnmHeader {
    pub format: PnmFormat,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    pub depth: u32,
    pub tuple_type: Option<String>,
}

impl PnmHeader {
    /// Bytes used to store one channel value, from the maxval range.
    pub fn bytes_per_sample(&self) -> usize {
        if self.maxval >> 24 != 0 {
            4
        } else if self.maxval >> 16 != 0 {
            3
        } else if self.maxval >> 8 != 0 {
            2
        } else {
            1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeaderState {
    /// Skipping whitespace before a field or a keyword's value.
    AwaitingSeparator,
    /// Inside a PAM keyword or tuple-type word.
    ScanningToken,
    /// Accumulating a decimal field.
    ScanningNumber,
    /// PAM only: between entries, waiting for the next keyword or `ENDHDR`.
    AwaitingEndOfHeader,
    Done,
}

#[derive(Clone, Copy, Debug)]
enum Class {
    Space,
    Digit(u8),
    Word(u8),
    End,
    Other(u8),
}

fn classify(c: Option<u8>) -> Class {
    match c {
        None => Class::End,
        Some(b) if is_space(b) => Class::Space,
        Some(b) if b.is_ascii_digit() => Class::Digit(b),
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => Class::Word(b),
        Some(b) => Class::Other(b),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Key {
    Width,
    Height,
    Depth,
    Maxval,
    TupleType,
    Unknown(String),
}

impl Key {
    fn from_keyword(word: String) -> Self {
        match word.as_str() {
            "WIDTH" => Key::Width,
            "HEIGHT" => Key::Height,
            "DEPTH" => Key::Depth,
            "MAXVAL" => Key::Maxval,
            "TUPLTYPE" => Key::TupleType,
            _ => Key::Unknown(word),
        }
    }

    fn field_name(&self) -> &'static str {
        match self {
            Key::Width => "WIDTH",
            Key::Height => "HEIGHT",
            Key::Depth => "DEPTH",
            Key::Maxval => "MAXVAL",
            Key::TupleType => "TUPLTYPE",
            Key::Unknown(_) => "unknown PAM field",
        }
    }
}

#[derive(Default, Debug)]
struct PamFields {
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<u32>,
    maxval: Option<u32>,
    tuple_type: Option<String>,
}

const FIXED_FIELD_NAMES: [&str; 3] = ["width", "height", "maxval"];

pub(crate) struct HeaderMachine {
    format: PnmFormat,
    state: HeaderState,
    number: u32,
    token: String,
    pending: Option<Key>,
    fields: [u32; 3],
    field_count: usize,
    pam: PamFields,
}

impl HeaderMachine {
    pub(crate) fn new(format: PnmFormat) -> Self {
        let state = if format == PnmFormat::Pam {
            HeaderState::AwaitingEndOfHeader
        } else {
            HeaderState::AwaitingSeparator
        };
        Self {
            format,
            state,
            number: 0,
            token: String::new(),
            pending: None,
            fields: [0; 3],
            field_count: 0,
            pam: PamFields::default(),
        }
    }

    pub(crate) fn state(&self) -> HeaderState {
        self.state
    }

    fn fields_needed(&self) -> usize {
        if self.format.is_bitmap() { 2 } else { 3 }
    }

    /// Advance by one comment-filtered character (`None` = end of stream).
    pub(crate) fn feed(&mut self, c: Option<u8>) -> Result<HeaderState, PnmError> {
        let class = classify(c);
        if self.format == PnmFormat::Pam {
            self.feed_keyed(class)?;
        } else {
            self.feed_fixed(class)?;
        }
        Ok(self.state)
    }

    fn unexpected(&self, b: u8) -> PnmError {
        PnmError::InvalidHeader(format!(
            "unexpected character {:?} in P{} header ({:?})",
            b as char,
            self.format.magic() as char,
            self.state
        ))
    }

    fn accumulate(&mut self, digit: u8, field: &'static str) -> Result<(), PnmError> {
        self.number = self
            .number
            .checked_mul(10)
            .and_then(|n| n.checked_add(u32::from(digit - b'0')))
            .ok_or(PnmError::IntegerOverflow(field))?;
        Ok(())
    }

    fn feed_fixed(&mut self, class: Class) -> Result<(), PnmError> {
        use HeaderState::*;
        match (self.state, class) {
            (Done, _) => {}
            (AwaitingSeparator, Class::Space) => {}
            (AwaitingSeparator, Class::Digit(d)) => {
                self.number = u32::from(d - b'0');
                self.state = ScanningNumber;
            }
            (AwaitingSeparator, Class::End) => return Err(PnmError::UnexpectedEof),
            (ScanningNumber, Class::Digit(d)) => {
                self.accumulate(d, FIXED_FIELD_NAMES[self.field_count])?;
            }
            (ScanningNumber, Class::Space | Class::End) => {
                self.fields[self.field_count] = self.number;
                self.field_count += 1;
                self.state = if self.field_count == self.fields_needed() {
                    Done
                } else {
                    AwaitingSeparator
                };
            }
            (_, Class::Word(b) | Class::Other(b)) => return Err(self.unexpected(b)),
            (ScanningToken | AwaitingEndOfHeader, _) => {
                return Err(PnmError::InvalidHeader(format!(
                    "state {:?} is not valid for P{} headers",
                    self.state,
                    self.format.magic() as char
                )));
            }
        }
        Ok(())
    }

    fn feed_keyed(&mut self, class: Class) -> Result<(), PnmError> {
        use HeaderState::*;
        match (self.state, class) {
            (Done, _) => {}
            (AwaitingEndOfHeader, Class::Space) => {}
            (AwaitingEndOfHeader, Class::Word(b)) => self.start_token(b),
            (AwaitingEndOfHeader, Class::Digit(_)) => {
                return Err(PnmError::InvalidHeader(
                    "value without keyword in PAM header".into(),
                ));
            }
            (AwaitingEndOfHeader | AwaitingSeparator, Class::End) => {
                return Err(PnmError::InvalidHeader(
                    "PAM header ended before ENDHDR".into(),
                ));
            }
            (ScanningToken, Class::Word(b) | Class::Digit(b)) => {
                if self.token.len() >= MAX_KEYWORD_LEN {
                    return Err(PnmError::InvalidHeader(format!(
                        "PAM token longer than {MAX_KEYWORD_LEN} characters"
                    )));
                }
                self.token.push(b as char);
            }
            (ScanningToken, Class::Space | Class::End) => self.finish_token(),
            (AwaitingSeparator, Class::Space) => {}
            (AwaitingSeparator, Class::Word(b) | Class::Digit(b))
                if self.pending == Some(Key::TupleType) =>
            {
                self.start_token(b);
            }
            (AwaitingSeparator, Class::Digit(d)) => {
                self.number = u32::from(d - b'0');
                self.state = ScanningNumber;
            }
            (AwaitingSeparator, Class::Word(b)) => {
                if let Some(key) = self.pending.take() {
                    debug!("PAM field {key:?} has no value");
                }
                self.start_token(b);
            }
            (ScanningNumber, Class::Digit(d)) => {
                let field = self.pending.as_ref().map_or("PAM field", Key::field_name);
                self.accumulate(d, field)?;
            }
            (ScanningNumber, Class::Space | Class::End) => {
                let value = self.number;
                match self.pending.take() {
                    Some(Key::Width) => self.pam.width = Some(value),
                    Some(Key::Height) => self.pam.height = Some(value),
                    Some(Key::Depth) => self.pam.depth = Some(value),
                    Some(Key::Maxval) => self.pam.maxval = Some(value),
                    Some(Key::Unknown(word)) => debug!("ignoring PAM field {word} = {value}"),
                    Some(Key::TupleType) | None => {}
                }
                self.state = AwaitingEndOfHeader;
            }
            (ScanningNumber, Class::Word(b)) | (_, Class::Other(b)) => {
                return Err(self.unexpected(b));
            }
        }
        Ok(())
    }

    fn start_token(&mut self, b: u8) {
        self.token.clear();
        self.token.push(b as char);
        self.state = HeaderState::ScanningToken;
    }

    fn finish_token(&mut self) {
        let word = std::mem::take(&mut self.token);
        if word == "ENDHDR" {
            if let Some(key) = self.pending.take() {
                debug!("PAM field {key:?} has no value");
            }
            self.state = HeaderState::Done;
        } else if self.pending == Some(Key::TupleType) {
            self.pending = None;
            self.pam.tuple_type = Some(word);
            self.state = HeaderState::AwaitingEndOfHeader;
        } else {
            self.pending = Some(Key::from_keyword(word));
            self.state = HeaderState::AwaitingSeparator;
        }
    }

    /// Validate the collected fields once the machine reached `Done`.
    pub(crate) fn finish(self) -> Result<PnmHeader, PnmError> {
        if self.state != HeaderState::Done {
            return Err(PnmError::InvalidHeader(format!(
                "header incomplete in state {:?}",
                self.state
            )));
        }
        let header = if self.format == PnmFormat::Pam {
            let missing =
                |name: &str| PnmError::InvalidHeader(format!("PAM header has no {name}"));
            PnmHeader {
                format: self.format,
                width: self.pam.width.ok_or_else(|| missing("WIDTH"))?,
                height: self.pam.height.ok_or_else(|| missing("HEIGHT"))?,
                maxval: self.pam.maxval.ok_or_else(|| missing("MAXVAL"))?,
                depth: self.pam.depth.unwrap_or(1),
                tuple_type: self.pam.tuple_type,
            }
        } else {
            let depth = match self.format {
                PnmFormat::PpmAscii | PnmFormat::PpmBinary => 3,
                _ => 1,
            };
            PnmHeader {
                format: self.format,
                width: self.fields[0],
                height: self.fields[1],
                maxval: if self.format.is_bitmap() { 1 } else { self.fields[2] },
                depth,
                tuple_type: None,
            }
        };
        if header.width == 0 || header.height == 0 {
            return Err(PnmError::InvalidHeader(format!(
                "zero dimension {}x{}",
                header.width, header.height
            )));
        }
        if header.maxval == 0 {
            return Err(PnmError::InvalidHeader("maxval is zero".into()));
        }
        if header.depth == 0 {
            return Err(PnmError::InvalidHeader("depth is zero".into()));
        }
        check_tuple_type(&header);
        Ok(header)
    }
}

/// TUPLTYPE is a hint; DEPTH decides the channel count.
fn check_tuple_type(header: &PnmHeader) {
    let Some(tt) = header.tuple_type.as_deref() else {
        return;
    };
    let agrees = if tt.starts_with("GRAYSCALE") || tt.starts_with("BLACKANDWHITE") {
        header.depth <= 2
    } else if tt.starts_with("RGB") {
        header.depth >= 3
    } else {
        true
    };
    if !agrees {
        warn!(
            "PAM TUPLTYPE {tt} disagrees with DEPTH {}, using DEPTH",
            header.depth
        );
    }
}

/// Read the magic pair and the header that follows it.
pub(crate) fn read_header<R: BufRead>(tok: &mut Tokenizer<R>) -> Result<PnmHeader, PnmError> {
    let first = tok.raw_byte()?.ok_or(PnmError::UnexpectedEof)?;
    let second = tok.raw_byte()?.ok_or(PnmError::UnexpectedEof)?;
    let format = match (first, PnmFormat::from_magic(second)) {
        (b'P', Some(format)) => format,
        _ => return Err(PnmError::UnrecognizedFormat { first, second }),
    };

    let mut machine = HeaderMachine::new(format);
    while machine.state() != HeaderState::Done {
        let c = tok.next_char()?;
        machine.feed(c)?;
    }
    let header = machine.finish()?;
    debug!(
        "P{} header: {}x{} depth={} maxval={} bytes/sample={}",
        format.magic() as char,
        header.width,
        header.height,
        header.depth,
        header.maxval,
        header.bytes_per_sample()
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnm::tokenizer::DEFAULT_EOF_BUDGET;
    use std::io::Cursor;

    fn parse(data: &[u8]) -> Result<PnmHeader, PnmError> {
        let mut tok = Tokenizer::new(Cursor::new(data), DEFAULT_EOF_BUDGET);
        read_header(&mut tok)
    }

    fn feed_all(machine: &mut HeaderMachine, data: &[u8]) -> Result<HeaderState, PnmError> {
        let mut state = machine.state();
        for &b in data {
            state = machine.feed(Some(b))?;
        }
        Ok(state)
    }

    #[test]
    fn fixed_states_step_through_fields() {
        let mut m = HeaderMachine::new(PnmFormat::PgmBinary);
        assert_eq!(m.state(), HeaderState::AwaitingSeparator);
        assert_eq!(m.feed(Some(b'1')).unwrap(), HeaderState::ScanningNumber);
        assert_eq!(m.feed(Some(b'2')).unwrap(), HeaderState::ScanningNumber);
        assert_eq!(m.feed(Some(b' ')).unwrap(), HeaderState::AwaitingSeparator);
        assert_eq!(feed_all(&mut m, b"\n\n3 255").unwrap(), HeaderState::ScanningNumber);
        assert_eq!(m.feed(Some(b'\n')).unwrap(), HeaderState::Done);
        let h = m.finish().unwrap();
        assert_eq!((h.width, h.height, h.maxval, h.depth), (12, 3, 255, 1));
    }

    #[test]
    fn bitmap_takes_two_fields() {
        let h = parse(b"P4\n# comment\n10 2\n").unwrap();
        assert_eq!(h.format, PnmFormat::PbmBinary);
        assert_eq!((h.width, h.height, h.maxval), (10, 2, 1));
    }

    #[test]
    fn plain_bitmap_without_separator_after_magic() {
        let h = parse(b"P16 2 000001 010011").unwrap();
        assert_eq!(h.format, PnmFormat::PbmAscii);
        assert_eq!((h.width, h.height), (6, 2));
    }

    #[test]
    fn comment_inside_a_number_is_transparent() {
        let h = parse(b"P2 1#split\n2 3 255\n").unwrap();
        assert_eq!((h.width, h.height), (12, 3));
    }

    #[test]
    fn bad_magic() {
        assert!(matches!(
            parse(b"P8 1 1 255\n"),
            Err(PnmError::UnrecognizedFormat {
                first: b'P',
                second: b'8'
            })
        ));
        assert!(matches!(
            parse(b"Q5 1 1 255\n"),
            Err(PnmError::UnrecognizedFormat { first: b'Q', .. })
        ));
    }

    #[test]
    fn letter_in_fixed_header_is_rejected() {
        assert!(matches!(
            parse(b"P5 12a 3 255\n"),
            Err(PnmError::InvalidHeader(_))
        ));
    }

    #[test]
    fn overflow_is_reported_immediately() {
        assert!(matches!(
            parse(b"P5 99999999999 1 255\n"),
            Err(PnmError::IntegerOverflow("width"))
        ));
    }

    #[test]
    fn truncated_fixed_header() {
        assert!(matches!(parse(b"P5 12 "), Err(PnmError::UnexpectedEof)));
    }

    #[test]
    fn keyed_header() {
        let h = parse(
            b"P7\nWIDTH 4\nHEIGHT 2\n# note\nDEPTH 3\nMAXVAL 65535\nTUPLTYPE RGB\nENDHDR\n",
        )
        .unwrap();
        assert_eq!(h.format, PnmFormat::Pam);
        assert_eq!((h.width, h.height, h.depth, h.maxval), (4, 2, 3, 65535));
        assert_eq!(h.tuple_type.as_deref(), Some("RGB"));
        assert_eq!(h.bytes_per_sample(), 2);
    }

    #[test]
    fn keyed_states() {
        let mut m = HeaderMachine::new(PnmFormat::Pam);
        assert_eq!(m.state(), HeaderState::AwaitingEndOfHeader);
        assert_eq!(feed_all(&mut m, b"\nWIDTH").unwrap(), HeaderState::ScanningToken);
        assert_eq!(m.feed(Some(b' ')).unwrap(), HeaderState::AwaitingSeparator);
        assert_eq!(m.feed(Some(b'7')).unwrap(), HeaderState::ScanningNumber);
        assert_eq!(m.feed(Some(b'\n')).unwrap(), HeaderState::AwaitingEndOfHeader);
        assert_eq!(feed_all(&mut m, b"ENDHDR").unwrap(), HeaderState::ScanningToken);
        assert_eq!(m.feed(Some(b'\n')).unwrap(), HeaderState::Done);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let h = parse(b"P7\nWIDTH 1\nHEIGHT 1\nFOO 12\nMAXVAL 255\nENDHDR\n").unwrap();
        assert_eq!((h.width, h.height, h.depth), (1, 1, 1));
    }

    #[test]
    fn endhdr_after_valueless_entry_still_terminates() {
        let h = parse(b"P7\nWIDTH 2\nHEIGHT 1\nMAXVAL 255\nCOMMENTLESS\nENDHDR\n").unwrap();
        assert_eq!((h.width, h.height), (2, 1));
    }

    #[test]
    fn endhdr_after_valueless_tuple_type_still_terminates() {
        let h = parse(b"P7\nWIDTH 1\nHEIGHT 1\nMAXVAL 255\nTUPLTYPE\nENDHDR\n").unwrap();
        assert_eq!((h.width, h.height, h.maxval), (1, 1, 255));
        assert_eq!(h.tuple_type, None);
    }

    #[test]
    fn missing_endhdr_is_a_header_error() {
        assert!(matches!(
            parse(b"P7\nWIDTH 2\nHEIGHT 2\nMAXVAL 255\n"),
            Err(PnmError::InvalidHeader(_))
        ));
    }

    #[test]
    fn missing_maxval() {
        assert!(matches!(
            parse(b"P7\nWIDTH 2\nHEIGHT 2\nENDHDR\n"),
            Err(PnmError::InvalidHeader(_))
        ));
    }

    #[test]
    fn tuple_type_does_not_override_depth() {
        let h = parse(b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 1\nMAXVAL 255\nTUPLTYPE RGB\nENDHDR\n")
            .unwrap();
        assert_eq!(h.depth, 1);
    }

    #[test]
    fn zero_fields_are_invalid() {
        assert!(matches!(parse(b"P5 0 1 255\n"), Err(PnmError::InvalidHeader(_))));
        assert!(matches!(parse(b"P5 1 1 0\n"), Err(PnmError::InvalidHeader(_))));
        assert!(matches!(
            parse(b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 0\nMAXVAL 255\nENDHDR\n"),
            Err(PnmError::InvalidHeader(_))
        ));
    }

    #[test]
    fn bytes_per_sample_ranges() {
        let mut h = parse(b"P5 1 1 255\n").unwrap();
        assert_eq!(h.bytes_per_sample(), 1);
        h.maxval = 256;
        assert_eq!(h.bytes_per_sample(), 2);
        h.maxval = 1 << 16;
        assert_eq!(h.bytes_per_sample(), 3);
        h.maxval = 1 << 24;
        assert_eq!(h.bytes_per_sample(), 4);
    }
}
