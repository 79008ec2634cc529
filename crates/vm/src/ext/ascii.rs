use std::iter;

use crate::core::{channel::Channel, constants::NEWLINE};

/// The output of an ASCII-speaking program, split into its text and the values that follow it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsciiOutput {
    /// The leading ASCII text.
    pub text: String,

    /// Everything from the first value outside the ASCII range onwards.
    pub values: Vec<i64>,
}

impl AsciiOutput {
    /// The lines of the text, without their terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// The first non-ASCII value, usually the answer a program reports after its prompt.
    pub fn value(&self) -> Option<i64> {
        self.values.first().copied()
    }
}

/// Encodes `line` as the byte codes of its characters followed by a newline.
///
/// ```
/// use intcode_vm::ext::ascii::encode_line;
///
/// assert_eq!(encode_line("A,B"), vec![65, 44, 66, 10]);
/// ```
pub fn encode_line(line: &str) -> Vec<i64> {
    line.bytes().map(i64::from).chain(iter::once(NEWLINE)).collect()
}

/// Queues `line`, followed by a newline, on `channel`.
pub fn feed_line(channel: &Channel, line: &str) {
    channel.send_all(encode_line(line));
}

/// Splits drained output into its leading ASCII text and the values that follow it.
///
/// ```
/// use intcode_vm::ext::ascii::decode;
///
/// let output = decode(&[46, 35, 10, 35, 46, 10, 1_000_000]);
/// assert_eq!(output.lines().collect::<Vec<_>>(), vec![".#", "#."]);
/// assert_eq!(output.value(), Some(1_000_000));
/// ```
pub fn decode(output: &[i64]) -> AsciiOutput {
    let split = output.iter().position(|value| !(0..=127).contains(value)).unwrap_or(output.len());
    let (text, values) = output.split_at(split);

    AsciiOutput {
        text: text.iter().filter_map(|value| u8::try_from(*value).ok()).map(char::from).collect(),
        values: values.to_vec(),
    }
}
