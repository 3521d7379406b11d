use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, space1},
    combinator::{eof, map_res, opt},
    sequence::preceded,
};

/// A single `@@ … @@` block of an [`Entry`](super::file::Entry).
///
/// `offset`/`length` address the owning [`Document`](super::full::Document)'s
/// flat line array: `offset` is the `@@` line itself and the range runs up to
/// the next `@@` line or the end of the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hunk {
    pub offset: usize,
    pub length: usize,
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
}

impl Hunk {
    pub fn line_start(&self) -> usize {
        self.offset
    }

    /// One past the last line of the hunk
    pub fn line_end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains_line(&self, index: usize) -> bool {
        (self.line_start()..self.line_end()).contains(&index)
    }
}

/// Line ranges parsed from a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
}

impl HunkHeader {
    /// Parse `@@ -old[,len] +new[,len]` followed by anything.
    ///
    /// A missing length means one line. Whatever follows the two ranges (the
    /// closing `@@` and git's function-context hint) is ignored; `None` for
    /// any other shape.
    pub fn parse(line: &str) -> Option<Self> {
        header(line).ok().map(|(_, header)| header)
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

/// `<marker><start>[,<length>]`
fn range(input: &str, marker: char) -> IResult<&str, (u32, u32)> {
    let (input, (_, start, length)) =
        (char(marker), number, opt(preceded(char(','), number))).parse(input)?;
    Ok((input, (start, length.unwrap_or(1))))
}

fn old_range(input: &str) -> IResult<&str, (u32, u32)> {
    range(input, '-')
}

fn new_range(input: &str) -> IResult<&str, (u32, u32)> {
    range(input, '+')
}

fn header(input: &str) -> IResult<&str, HunkHeader> {
    let (rest, (_, _, (old_start, old_length), _, (new_start, new_length), _)) = (
        tag("@@"),
        space1,
        old_range,
        space1,
        new_range,
        alt((space1, eof)),
    )
        .parse(input)?;

    Ok((
        rest,
        HunkHeader {
            old_start,
            old_length,
            new_start,
            new_length,
        },
    ))
}
